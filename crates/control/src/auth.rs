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

//! Bearer-token authentication for the three callers `control` serves:
//! boot-workers (a single shared key, like `WorkerConfig::worker_api_key`),
//! admin tooling (a single shared key), and enrolled agents (a per-agent
//! hashed token minted by `agent-protocol`).

use actix_web::HttpRequest;
use chrono::Utc;
use gough_core::model::{Agent, AgentStatus};
use gough_core::Classified;

use crate::store::Store;

pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(|s| s.trim().to_string())
}

pub fn require_shared_key(req: &HttpRequest, expected: &str) -> Result<(), Classified> {
    let presented = bearer_token(req).ok_or_else(|| Classified::Unauthorized("missing bearer token".into()))?;
    if presented == expected {
        Ok(())
    } else {
        Err(Classified::Unauthorized("bad bearer token".into()))
    }
}

pub fn authenticate_agent(req: &HttpRequest, store: &Store) -> Result<Agent, Classified> {
    let presented = bearer_token(req).ok_or_else(|| Classified::Unauthorized("missing bearer token".into()))?;
    let hash = agent_protocol::hash_token(&presented);
    let agent = store
        .agent_by_token_hash(&hash)
        .ok_or_else(|| Classified::Unauthorized("unknown agent token".into()))?;
    agent_protocol::check_presented_token(
        &presented,
        &agent.token_hash,
        agent.token_expires_at,
        agent_protocol::DEFAULT_AGENT_TOKEN_TTL,
        Utc::now(),
    )
    .map_err(Classified::from)?;
    if agent.status == AgentStatus::Suspended {
        return Err(Classified::Forbidden(
            agent.suspend_reason.clone().unwrap_or_else(|| "agent suspended".into()),
        ));
    }
    Ok(agent)
}
