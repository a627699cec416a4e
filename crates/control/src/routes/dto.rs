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

//! Wire request/response shapes for `control`'s HTTP surface (§6) that
//! aren't already one of `gough_core::model`'s entities.

use std::collections::BTreeSet;

use gough_core::model::{AgentStatus, DhcpMode, EggSelector, QuickStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BootScriptQuery {
    pub mac: String,
    pub worker_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BootScriptResponse {
    pub script: String,
    pub machine_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CloudInitResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ImageUrlResponse {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct WorkerEnrollRequest {
    pub worker_id: String,
    pub site: String,
    pub dhcp_mode: DhcpMode,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    pub base_url: String,
}

#[derive(Debug, Serialize)]
pub struct WorkerEnrollResponse {
    pub worker_id: String,
    pub session_token: String,
    pub token_expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct WorkerHeartbeatRequest {
    pub worker_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentKeyRequest {
    #[serde(default = "default_true")]
    pub single_use: bool,
    #[serde(default)]
    pub scope_tags: BTreeSet<String>,
    pub ttl_seconds: i64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CreateEnrollmentKeyResponse {
    pub key_id: String,
    /// Returned exactly once, at creation, per §4.5.
    pub plaintext_key: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AgentEnrollRequest {
    pub enrollment_key_id: String,
    pub presented_key: String,
    pub name: String,
    pub agent_type: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub machine_id: String,
}

#[derive(Debug, Serialize)]
pub struct AgentEnrollResponse {
    pub agent_id: String,
    pub agent_token: String,
    pub token_expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AgentHeartbeatRequest {
    pub status: String,
    #[serde(default)]
    pub quick_stats: QuickStats,
}

#[derive(Debug, Serialize)]
pub struct AgentHeartbeatResponse {
    pub acknowledged: bool,
    pub next_heartbeat_interval_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct TokenRefreshResponse {
    pub agent_token: String,
    pub token_expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SuspendAgentRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAgentsQuery {
    pub status: Option<AgentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SshCaSignRequest {
    pub user_email: String,
    pub user_public_key: String,
    pub principals: Vec<String>,
    pub validity_seconds: u64,
    pub resource_type: String,
    pub resource_id: String,
}

#[derive(Debug, Serialize)]
pub struct SshCaSignResponse {
    pub certificate: String,
    pub key_id: String,
    pub valid_before: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeploymentRequest {
    pub machine_id: String,
    pub image: String,
    pub eggs: EggSelector,
}

#[derive(Debug, Deserialize)]
pub struct BootEventRequest {
    pub mac: String,
    pub ip: Option<String>,
    pub event_type: gough_core::model::BootEventType,
    #[serde(default)]
    pub details: serde_json::Value,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub eggs: EggSelector,
    pub machine_id: String,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub cloud_init: String,
}

#[derive(Debug, Deserialize)]
pub struct CommissionRequest {
    #[serde(default)]
    pub hardware_info: serde_json::Value,
}
