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

//! The env-var surface §6 mandates for a worker, built once at startup and
//! passed by reference into every sub-service — never global mutable
//! state, per the §9 design note on configuration.

use std::net::Ipv4Addr;

use anyhow::{bail, Context, Result};
use gough_core::model::DhcpMode;

#[derive(Debug, Clone)]
pub struct FullDhcpConfig {
    pub subnet: Ipv4Addr,
    pub range_start: Ipv4Addr,
    pub range_end: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub control_url: String,
    pub worker_api_key: String,
    pub worker_id: String,
    pub dhcp_mode: DhcpMode,
    pub dhcp_interface: String,
    pub http_port: u16,
    pub tftp_root: String,
    pub full_dhcp: Option<FullDhcpConfig>,
}

fn env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing required environment variable {name}"))
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl WorkerConfig {
    /// Loads every variable §6 lists as minimum worker config, plus the
    /// `full`-mode-only subnet/range/gateway set.
    pub fn from_env() -> Result<Self> {
        let dhcp_mode = match env("DHCP_MODE")?.to_lowercase().as_str() {
            "full" => DhcpMode::Full,
            "proxy" => DhcpMode::Proxy,
            "disabled" => DhcpMode::Disabled,
            other => bail!("DHCP_MODE must be full, proxy or disabled, got {other}"),
        };

        let full_dhcp = if dhcp_mode == DhcpMode::Full {
            Some(FullDhcpConfig {
                subnet: env("DHCP_SUBNET")?.parse().context("DHCP_SUBNET must be an IPv4 address")?,
                range_start: env("DHCP_RANGE_START")?
                    .parse()
                    .context("DHCP_RANGE_START must be an IPv4 address")?,
                range_end: env("DHCP_RANGE_END")?
                    .parse()
                    .context("DHCP_RANGE_END must be an IPv4 address")?,
                gateway: env("DHCP_GATEWAY")?.parse().context("DHCP_GATEWAY must be an IPv4 address")?,
            })
        } else {
            None
        };

        Ok(Self {
            control_url: env("CONTROL_URL")?.trim_end_matches('/').to_string(),
            worker_api_key: env("WORKER_API_KEY")?,
            worker_id: env("WORKER_ID")?,
            dhcp_mode,
            dhcp_interface: env_opt("DHCP_INTERFACE").unwrap_or_default(),
            http_port: env_opt("HTTP_PORT")
                .map(|v| v.parse().context("HTTP_PORT must be a u16"))
                .transpose()?
                .unwrap_or(8080),
            tftp_root: env_opt("TFTP_ROOT").unwrap_or_else(|| "/var/lib/gough/tftp".to_string()),
            full_dhcp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests that
    // touch them so parallel test execution can't interleave writes.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_dhcp_vars() {
        for var in [
            "DHCP_MODE",
            "DHCP_SUBNET",
            "DHCP_RANGE_START",
            "DHCP_RANGE_END",
            "DHCP_GATEWAY",
            "CONTROL_URL",
            "WORKER_API_KEY",
            "WORKER_ID",
            "DHCP_INTERFACE",
            "HTTP_PORT",
            "TFTP_ROOT",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn proxy_mode_does_not_require_subnet_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_dhcp_vars();
        std::env::set_var("CONTROL_URL", "http://control:9000/");
        std::env::set_var("WORKER_API_KEY", "secret");
        std::env::set_var("WORKER_ID", "worker-1");
        std::env::set_var("DHCP_MODE", "proxy");

        let cfg = WorkerConfig::from_env().unwrap();
        assert_eq!(cfg.control_url, "http://control:9000");
        assert!(cfg.full_dhcp.is_none());
        assert_eq!(cfg.http_port, 8080);
        clear_dhcp_vars();
    }

    #[test]
    fn full_mode_requires_subnet_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_dhcp_vars();
        std::env::set_var("CONTROL_URL", "http://control:9000");
        std::env::set_var("WORKER_API_KEY", "secret");
        std::env::set_var("WORKER_ID", "worker-1");
        std::env::set_var("DHCP_MODE", "full");

        assert!(WorkerConfig::from_env().is_err());

        std::env::set_var("DHCP_SUBNET", "10.0.0.0");
        std::env::set_var("DHCP_RANGE_START", "10.0.0.10");
        std::env::set_var("DHCP_RANGE_END", "10.0.0.200");
        std::env::set_var("DHCP_GATEWAY", "10.0.0.1");

        let cfg = WorkerConfig::from_env().unwrap();
        assert!(cfg.full_dhcp.is_some());
        clear_dhcp_vars();
    }
}
