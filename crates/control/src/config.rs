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

//! Environment-driven configuration, in the style of `boot-worker`'s
//! `WorkerConfig::from_env`. An optional TOML file layers defaults under
//! the environment so an operator can ship one config file per site and
//! still override a single value at launch.

use std::env;
use std::fs;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use deployment_orchestrator::OrchestratorConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8090";

#[derive(Debug, Clone)]
pub struct ControlConfig {
    pub bind_addr: SocketAddr,
    pub site: String,
    /// Shared secret `boot-worker`'s `ControlClient` presents on every
    /// `/internal/*` call and on `/workers/heartbeat`.
    pub worker_api_key: String,
    /// Shared secret required on the admin-only routes (enrollment key
    /// issuance, agent suspension, worker listing).
    pub admin_api_key: String,
    /// Default validity enforced on `/ssh-ca/sign` in excess of
    /// `agent_protocol::ssh_ca::DEFAULT_MAX_VALIDITY_SECONDS`, if set lower.
    pub max_ssh_cert_validity_secs: u64,
    pub orchestrator: OrchestratorConfig,
}

/// The subset of fields an operator may override from a TOML file; anything
/// absent falls back to the environment, then to a hardcoded default.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind_addr: Option<String>,
    site: Option<String>,
    worker_api_key: Option<String>,
    admin_api_key: Option<String>,
    max_ssh_cert_validity_secs: Option<u64>,
}

impl ControlConfig {
    pub fn from_env() -> Result<Self> {
        let file = match env::var("CONTROL_CONFIG_FILE") {
            Ok(path) => {
                let text = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
                toml::from_str(&text).with_context(|| format!("parsing {path} as TOML"))?
            }
            Err(_) => FileConfig::default(),
        };

        let bind_addr = env_opt("BIND_ADDR")
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a host:port")?;
        let site = env_opt("SITE").or(file.site).unwrap_or_else(|| "default".to_string());
        let worker_api_key = env_opt("WORKER_API_KEY")
            .or(file.worker_api_key)
            .context("WORKER_API_KEY must be set (in the environment or CONTROL_CONFIG_FILE)")?;
        let admin_api_key = env_opt("ADMIN_API_KEY")
            .or(file.admin_api_key)
            .context("ADMIN_API_KEY must be set (in the environment or CONTROL_CONFIG_FILE)")?;
        let max_ssh_cert_validity_secs = env_opt("MAX_SSH_CERT_VALIDITY_SECS")
            .map(|v| v.parse().context("MAX_SSH_CERT_VALIDITY_SECS must be an integer"))
            .transpose()?
            .or(file.max_ssh_cert_validity_secs)
            .unwrap_or(agent_protocol::DEFAULT_MAX_VALIDITY_SECONDS);

        Ok(Self {
            bind_addr,
            site,
            worker_api_key,
            admin_api_key,
            max_ssh_cert_validity_secs,
            orchestrator: OrchestratorConfig::default(),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
