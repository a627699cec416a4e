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

//! `gough deployments ...`, mirroring §6 `/deployments/*`.

use anyhow::{bail, Result};
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum Deployments {
    /// `POST /deployments`
    Create {
        #[structopt(long)]
        machine_id: String,
        #[structopt(long)]
        image: String,
        /// Comma-separated egg names. Mutually exclusive with `--group`.
        #[structopt(long)]
        eggs: Option<String>,
        /// A named egg group. Mutually exclusive with `--eggs`.
        #[structopt(long)]
        group: Option<String>,
    },
    /// `GET /deployments`
    List,
    /// `GET /deployments/{job_id}`
    Get { job_id: String },
    /// `POST /deployments/{job_id}/cancel`
    Cancel { job_id: String },
    /// `POST /deployments/{job_id}/retry`
    Retry { job_id: String },
}

impl Deployments {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            Deployments::Create { machine_id, image, eggs, group } => {
                let selector = match (eggs, group) {
                    (Some(_), Some(_)) => bail!("pass either --eggs or --group, not both"),
                    (Some(list), None) => {
                        serde_json::Value::Array(list.split(',').map(|s| serde_json::Value::String(s.trim().to_string())).collect())
                    }
                    (None, Some(name)) => serde_json::Value::String(name),
                    (None, None) => bail!("one of --eggs or --group is required"),
                };
                client
                    .post(
                        "/deployments",
                        &serde_json::json!({ "machine_id": machine_id, "image": image, "eggs": selector }),
                    )
                    .await
            }
            Deployments::List => client.get("/deployments").await,
            Deployments::Get { job_id } => client.get(&format!("/deployments/{job_id}")).await,
            Deployments::Cancel { job_id } => client.post_empty(&format!("/deployments/{job_id}/cancel")).await,
            Deployments::Retry { job_id } => client.post_empty(&format!("/deployments/{job_id}/retry")).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structopt::StructOpt;

    #[derive(StructOpt)]
    struct Wrapper {
        #[structopt(subcommand)]
        deployments: Deployments,
    }

    #[test]
    fn parses_both_eggs_and_group_flags() {
        let Wrapper { deployments } = Wrapper::from_iter(&[
            "deployments",
            "create",
            "--machine-id",
            "m-1",
            "--image",
            "ubuntu-24.04-amd64",
            "--eggs",
            "base,web",
            "--group",
            "standard",
        ]);
        let Deployments::Create { eggs, group, .. } = deployments else {
            panic!("expected Create");
        };
        assert!(eggs.is_some());
        assert!(group.is_some());
    }

    #[test]
    fn parses_comma_separated_eggs() {
        let Wrapper { deployments } = Wrapper::from_iter(&[
            "deployments",
            "create",
            "--machine-id",
            "m-1",
            "--image",
            "ubuntu-24.04-amd64",
            "--eggs",
            "base,web",
        ]);
        let Deployments::Create { eggs, .. } = deployments else {
            panic!("expected Create");
        };
        assert_eq!(eggs.as_deref(), Some("base,web"));
    }
}
