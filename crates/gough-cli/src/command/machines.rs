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

//! `gough machines ...`, mirroring §6 `/machines/*`.

use anyhow::Result;
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum Machines {
    /// `GET /machines`
    List,
    /// `GET /machines/{system_id}`
    Get { system_id: String },
    /// `POST /machines/{system_id}/commission`
    Commission {
        system_id: String,
        /// Inline JSON for the captured hardware inventory.
        #[structopt(long)]
        hardware_info: Option<String>,
    },
    /// `POST /machines/{system_id}/release`
    Release { system_id: String },
    /// `POST /machines/{system_id}/hard-reset`
    HardReset { system_id: String },
    /// `POST /machines/{system_id}/reimage`
    Reimage { system_id: String },
}

impl Machines {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            Machines::List => client.get("/machines").await,
            Machines::Get { system_id } => client.get(&format!("/machines/{system_id}")).await,
            Machines::Commission { system_id, hardware_info } => {
                let hardware_info = match hardware_info {
                    Some(raw) => serde_json::from_str(&raw)?,
                    None => serde_json::Value::Null,
                };
                client
                    .post(
                        &format!("/machines/{system_id}/commission"),
                        &serde_json::json!({ "hardware_info": hardware_info }),
                    )
                    .await
            }
            Machines::Release { system_id } => client.post_empty(&format!("/machines/{system_id}/release")).await,
            Machines::HardReset { system_id } => client.post_empty(&format!("/machines/{system_id}/hard-reset")).await,
            Machines::Reimage { system_id } => client.post_empty(&format!("/machines/{system_id}/reimage")).await,
        }
    }
}
