// Copyright 2026 The Gough Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `gough eggs ...` / `gough egg-groups ...`, mirroring §6 `/eggs/*`,
//! `/egg-groups/*`, and `/eggs/render`.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum Eggs {
    /// `GET /eggs`
    List,
    /// `GET /eggs/{name}`
    Get { name: String },
    /// `PUT /eggs/{name}` with the egg's JSON read from `--file`.
    Put {
        name: String,
        #[structopt(long, parse(from_os_str))]
        file: PathBuf,
    },
    /// `DELETE /eggs/{name}`
    Delete { name: String },
    /// `GET /egg-groups`
    ListGroups,
    /// `GET /egg-groups/{name}`
    GetGroup { name: String },
    /// `PUT /egg-groups/{name}` with the group's JSON read from `--file`.
    PutGroup {
        name: String,
        #[structopt(long, parse(from_os_str))]
        file: PathBuf,
    },
    /// `DELETE /egg-groups/{name}`
    DeleteGroup { name: String },
    /// `POST /eggs/render`
    Render {
        #[structopt(long)]
        machine_id: String,
        /// Comma-separated egg names. Mutually exclusive with `--group`.
        #[structopt(long)]
        eggs: Option<String>,
        /// A named egg group. Mutually exclusive with `--eggs`.
        #[structopt(long)]
        group: Option<String>,
    },
}

impl Eggs {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            Eggs::List => client.get("/eggs").await,
            Eggs::Get { name } => client.get(&format!("/eggs/{name}")).await,
            Eggs::Put { name, file } => {
                let body = read_json(&file)?;
                client.put(&format!("/eggs/{name}"), &body).await
            }
            Eggs::Delete { name } => client.delete(&format!("/eggs/{name}")).await,
            Eggs::ListGroups => client.get("/egg-groups").await,
            Eggs::GetGroup { name } => client.get(&format!("/egg-groups/{name}")).await,
            Eggs::PutGroup { name, file } => {
                let body = read_json(&file)?;
                client.put(&format!("/egg-groups/{name}"), &body).await
            }
            Eggs::DeleteGroup { name } => client.delete(&format!("/egg-groups/{name}")).await,
            Eggs::Render { machine_id, eggs, group } => {
                let selector = match (eggs, group) {
                    (Some(_), Some(_)) => bail!("pass either --eggs or --group, not both"),
                    (Some(list), None) => {
                        serde_json::Value::Array(list.split(',').map(|s| serde_json::Value::String(s.trim().to_string())).collect())
                    }
                    (None, Some(name)) => serde_json::Value::String(name),
                    (None, None) => bail!("one of --eggs or --group is required"),
                };
                client
                    .post("/eggs/render", &serde_json::json!({ "machine_id": machine_id, "eggs": selector }))
                    .await
            }
        }
    }
}

fn read_json(path: &PathBuf) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}
