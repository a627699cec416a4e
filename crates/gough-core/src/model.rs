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

//! The entities of §3, with every field §3 names. Every mutable row carries
//! `created_at`/`updated_at`, per §6's persisted-state layout note.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `Machine.status`. Edges between these are enforced by `control-machine`,
/// not by this type — this crate only holds the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    Unknown,
    Discovered,
    Commissioning,
    Ready,
    Deploying,
    Deployed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootMode {
    Bios,
    Uefi,
    UefiHttp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Amd64,
    Arm64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredArchitecture {
    Any,
    Amd64,
    Arm64,
}

impl RequiredArchitecture {
    pub fn matches(self, arch: Architecture) -> bool {
        match self {
            Self::Any => true,
            Self::Amd64 => arch == Architecture::Amd64,
            Self::Arm64 => arch == Architecture::Arm64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerType {
    Ipmi,
    Redfish,
    Wol,
    Manual,
}

/// A physical or virtual node under management. §3 "Machine".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub system_id: String,
    pub mac_address: String,
    pub status: MachineStatus,
    pub hostname: Option<String>,
    pub ip: Option<String>,
    pub boot_mode: BootMode,
    pub architecture: Architecture,
    pub cpu_count: u32,
    pub memory_mb: u64,
    pub storage_gb: u64,
    pub bmc_address: Option<String>,
    pub power_type: PowerType,
    pub zone: Option<String>,
    pub pool: Option<String>,
    pub tags: BTreeSet<String>,
    pub hardware_info: Option<serde_json::Value>,
    pub assigned_eggs: Vec<String>,
    pub boot_config: Option<String>,
    pub last_boot_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub deployed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Machine {
    /// Normalizes a MAC address the way every boot-path lookup does:
    /// strip colons/dashes, lowercase. See §4.1.
    pub fn normalize_mac(mac: &str) -> String {
        mac.chars()
            .filter(|c| *c != ':' && *c != '-')
            .collect::<String>()
            .to_lowercase()
    }

    pub fn new_discovered(system_id: String, mac_address: String, now: DateTime<Utc>) -> Self {
        Self {
            system_id,
            mac_address: Self::normalize_mac(&mac_address),
            status: MachineStatus::Discovered,
            hostname: None,
            ip: None,
            boot_mode: BootMode::Uefi,
            architecture: Architecture::Amd64,
            cpu_count: 0,
            memory_mb: 0,
            storage_gb: 0,
            bmc_address: None,
            power_type: PowerType::Manual,
            zone: None,
            pool: None,
            tags: BTreeSet::new(),
            hardware_info: None,
            assigned_eggs: Vec::new(),
            boot_config: None,
            last_boot_at: None,
            last_seen_at: Some(now),
            deployed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A deployable unit. §3 "Egg", a tagged union over `egg_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "egg_type", rename_all = "snake_case")]
pub enum EggPayload {
    Snap {
        snap_name: String,
        channel: String,
        classic: bool,
    },
    CloudInit {
        content: String,
    },
    LxdContainer {
        image_alias: String,
        image_url: Option<String>,
        profiles: Vec<String>,
    },
    LxdVm {
        image_alias: String,
        image_url: Option<String>,
        profiles: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Egg {
    pub name: String,
    pub display_name: String,
    pub version: String,
    pub category: String,
    pub payload: EggPayload,
    pub dependencies: Vec<String>,
    pub min_ram_mb: u64,
    pub min_disk_gb: u64,
    pub required_architecture: RequiredArchitecture,
    /// Whether this egg's deployment failure is tolerable: the job logs a
    /// warning, marks the egg skipped, and continues rather than failing
    /// outright (§4.4, §7 partial-failure semantics).
    #[serde(default)]
    pub ignore_errors: bool,
    pub is_active: bool,
    pub checksum: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// §3 "EggGroup": an ordered list of `{egg-ref, order}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EggGroup {
    pub name: String,
    pub display_name: String,
    pub members: Vec<EggGroupMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EggGroupMember {
    pub egg_name: String,
    pub order: i64,
}

/// A reference to either a bare list of eggs or a named group, as accepted
/// by `EggEngine::resolve` and `POST /eggs/render`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EggSelector {
    Eggs(Vec<String>),
    Group(String),
}

/// §3 "BootImage".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootImage {
    pub name: String,
    pub architecture: Architecture,
    pub kernel_path: String,
    pub initrd_path: String,
    pub squashfs_path: Option<String>,
    pub kernel_params: String,
    pub checksum: String,
    pub size_bytes: u64,
}

/// §3 "BootConfig".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootConfig {
    pub name: String,
    pub default_image: String,
    pub egg_group: Option<String>,
    pub timeout_seconds: u32,
    pub ipxe_script_override: Option<String>,
    pub kernel_param_override: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    PowerOn,
    PxeBoot,
    OsInstall,
    EggDeploy,
    Complete,
    Failed,
}

impl DeploymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// §3 "DeploymentJob".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentJob {
    pub job_id: String,
    pub machine_id: String,
    pub image_id: String,
    pub eggs_to_deploy: Vec<String>,
    pub rendered_cloud_init: Option<String>,
    pub status: DeploymentStatus,
    pub progress_percent: u8,
    pub current_phase: String,
    pub log_output: Vec<String>,
    pub error_message: Option<String>,
    pub skipped_eggs: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootEventType {
    DhcpRequest,
    TftpRequest,
    BootStart,
    OsInstalled,
    EggStarted,
    EggComplete,
    DeploymentComplete,
    Error,
}

/// §3 "BootEvent": append-only ground-truth trigger log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootEvent {
    pub machine_id: Option<String>,
    pub mac: String,
    pub ip: Option<String>,
    pub event_type: BootEventType,
    pub details: serde_json::Value,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DhcpMode {
    Full,
    Proxy,
    Disabled,
}

/// §3 "Worker": a registered BootWorker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub worker_id: String,
    pub site: String,
    pub dhcp_mode: DhcpMode,
    pub capabilities: BTreeSet<String>,
    /// The base URL this worker's own HTTP surface is reachable at, as
    /// declared at enroll time — substituted into iPXE scripts that chain
    /// to `/images/...`, `/boot-event`, etc. (§4.2, §6's "iPXE script
    /// contract").
    pub base_url: String,
    pub session_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub consecutive_missed_heartbeats: u32,
    pub suspect: bool,
}

/// §4.5 "enrollment key": admin-created, single-response-only shared
/// secret an agent presents once to bootstrap into an `Agent` record. Only
/// `key_hash` is persisted; the plaintext is returned to the admin exactly
/// once, at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentKey {
    pub key_id: String,
    pub key_hash: String,
    pub single_use: bool,
    pub consumed_at: Option<DateTime<Utc>>,
    pub scope_tags: BTreeSet<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EnrollmentKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.single_use && self.consumed_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Offline,
    Suspended,
}

/// §3 "Agent": software running on a deployed machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub machine_id: String,
    pub enrollment_key_id: String,
    pub status: AgentStatus,
    pub quick_stats: QuickStats,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub consecutive_missed_heartbeats: u32,
    pub token_hash: String,
    pub token_expires_at: DateTime<Utc>,
    pub suspend_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuickStats {
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub disk_percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Read,
    Write,
    Execute,
    Admin,
    Shell,
}

/// §3 "ResourceTeam".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTeam {
    pub team_id: String,
    pub name: String,
    pub members: HashMap<String, TeamRole>,
}

/// §3 "ResourceAssignment": a team's permission-set on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub team_id: String,
    pub resource_type: String,
    pub resource_id: String,
    pub permissions: BTreeSet<Permission>,
    pub allowed_principals: Vec<String>,
}

/// §3 "ShellSession": the authorized, time-bounded interactive connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellSession {
    pub session_id: String,
    pub user: String,
    pub resource_type: String,
    pub resource_id: String,
    pub key_id: String,
    pub principals: Vec<String>,
    pub valid_after: DateTime<Utc>,
    pub valid_before: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mac_like_the_boot_path_does() {
        assert_eq!(Machine::normalize_mac("AA:BB:CC:11:22:33"), "aabbcc112233");
        assert_eq!(Machine::normalize_mac("aa-bb-cc-11-22-33"), "aabbcc112233");
    }

    #[test]
    fn required_architecture_matches() {
        assert!(RequiredArchitecture::Any.matches(Architecture::Arm64));
        assert!(RequiredArchitecture::Amd64.matches(Architecture::Amd64));
        assert!(!RequiredArchitecture::Amd64.matches(Architecture::Arm64));
    }
}
