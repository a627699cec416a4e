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

//! `gough agents ...`, mirroring §6 `/agents/*`. Enrollment, heartbeat, and
//! token refresh are the agent's own job; this covers the admin-only
//! surface: enrollment-key issuance, listing, and suspension.

use anyhow::Result;
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum Agents {
    /// `GET /agents`, optionally filtered by status.
    List {
        #[structopt(long)]
        status: Option<String>,
    },
    /// `POST /agents/enrollment-keys`
    CreateEnrollmentKey {
        #[structopt(long, default_value = "3600")]
        ttl_seconds: i64,
        #[structopt(long)]
        single_use: Option<bool>,
        /// Comma-separated scope tags.
        #[structopt(long)]
        scope_tags: Option<String>,
    },
    /// `POST /agents/{agent_id}/suspend`
    Suspend {
        agent_id: String,
        #[structopt(long)]
        reason: String,
    },
}

impl Agents {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            Agents::List { status } => match status {
                Some(status) => client.get(&format!("/agents?status={status}")).await,
                None => client.get("/agents").await,
            },
            Agents::CreateEnrollmentKey { ttl_seconds, single_use, scope_tags } => {
                let scope_tags: Vec<String> = scope_tags
                    .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default();
                client
                    .post(
                        "/agents/enrollment-keys",
                        &serde_json::json!({
                            "ttl_seconds": ttl_seconds,
                            "single_use": single_use.unwrap_or(true),
                            "scope_tags": scope_tags,
                        }),
                    )
                    .await
            }
            Agents::Suspend { agent_id, reason } => {
                client.post(&format!("/agents/{agent_id}/suspend"), &serde_json::json!({ "reason": reason })).await
            }
        }
    }
}
