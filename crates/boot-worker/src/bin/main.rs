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

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use boot_worker::{cache::ScriptCache, config::WorkerConfig, control_client::ControlClient, dhcp, http, tftp};
use gough_core::model::DhcpMode;
use log::{error, info};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

async fn run_heartbeat_loop(control: Arc<ControlClient>) {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = control.heartbeat().await {
            error!(target: "boot_worker::main", "heartbeat failed: {e}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = WorkerConfig::from_env()?;
    info!(target: "boot_worker::main", "starting worker {} in {:?} mode", config.worker_id, config.dhcp_mode);

    let cache = Arc::new(ScriptCache::default());
    let control = Arc::new(ControlClient::new(&config, cache));

    // The worker's own address on the boot network; used as DHCP
    // server-id/next-server. Loopback-only interfaces aside, this always
    // resolves on a real boot network — a worker with no usable interface
    // address can't serve PXE traffic regardless.
    let http_host: Ipv4Addr = config
        .full_dhcp
        .as_ref()
        .map(|f| f.gateway)
        .unwrap_or(Ipv4Addr::new(0, 0, 0, 0));

    let http_config = config.clone();
    let http_control = control.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http::run_http_server(&http_config, http_control).await {
            error!(target: "boot_worker::main", "http server exited: {e}");
        }
    });

    let tftp_root = config.tftp_root.clone();
    let tftp_task = tokio::spawn(async move {
        if let Err(e) = tftp::run(&tftp_root, 69).await {
            error!(target: "boot_worker::main", "tftp server exited: {e}");
        }
    });

    let dhcp_config = config.clone();
    let dhcp_task = tokio::spawn(async move {
        if dhcp_config.dhcp_mode != DhcpMode::Disabled {
            if let Err(e) = dhcp::run(&dhcp_config, http_host).await {
                error!(target: "boot_worker::main", "dhcp server exited: {e}");
            }
        }
    });

    let heartbeat_control = control.clone();
    let heartbeat_task = tokio::spawn(run_heartbeat_loop(heartbeat_control));

    let _ = tokio::join!(http_task, tftp_task, dhcp_task, heartbeat_task);
    Ok(())
}
