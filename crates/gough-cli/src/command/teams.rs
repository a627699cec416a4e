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

//! `gough teams ...`, mirroring §6 `/teams/*` — the capability model of §3.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum Teams {
    /// `GET /teams`
    List,
    /// `GET /teams/{team_id}`
    Get { team_id: String },
    /// `POST /teams` with the team's JSON read from `--file`.
    Upsert {
        #[structopt(long, parse(from_os_str))]
        file: PathBuf,
    },
    /// `POST /teams/assignments` with the assignment's JSON read from
    /// `--file`.
    Assign {
        #[structopt(long, parse(from_os_str))]
        file: PathBuf,
    },
    /// `GET /teams/assignments/{resource_type}/{resource_id}`
    AssignmentsFor { resource_type: String, resource_id: String },
}

impl Teams {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            Teams::List => client.get("/teams").await,
            Teams::Get { team_id } => client.get(&format!("/teams/{team_id}")).await,
            Teams::Upsert { file } => client.post("/teams", &read_json(&file)?).await,
            Teams::Assign { file } => client.post("/teams/assignments", &read_json(&file)?).await,
            Teams::AssignmentsFor { resource_type, resource_id } => {
                client.get(&format!("/teams/assignments/{resource_type}/{resource_id}")).await
            }
        }
    }
}

fn read_json(path: &PathBuf) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}
