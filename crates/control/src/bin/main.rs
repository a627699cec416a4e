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

//! Entry point for `gough-control`: loads [`ControlConfig`], mints the
//! SSH-CA keypair, wires [`control::routes::configure`] onto an
//! `actix_web::HttpServer`, and spawns the heartbeat sweep alongside it.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use agent_protocol::ssh_ca::CaKeypair;
use anyhow::{Context, Result};
use control::{heartbeat_sweep, routes, AppState, ControlConfig};

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ControlConfig::from_env().context("loading control config")?;
    let bind_addr = config.bind_addr;

    // The CA signs short-lived certificates only (§4.5); nothing else in
    // this service persists across a restart either, so a fresh keypair
    // at boot is consistent with the rest of the in-memory design rather
    // than a gap in it. An operator who needs a stable CA across restarts
    // sets `CONTROL_CONFIG_FILE` and fronts this with a real Secrets/KMS
    // backend that survives the process.
    let ssh_ca = CaKeypair::generate().context("generating SSH CA keypair")?;
    log::info!(
        target: "gough_control",
        "ssh-ca public key: {}",
        ssh_ca.public_key_openssh().context("encoding SSH CA public key")?
    );

    let state = web::Data::new(AppState::new(config, ssh_ca));

    tokio::spawn(heartbeat_sweep::run(state.clone()));

    log::info!(target: "gough_control", "listening on {bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(4 * 1024 * 1024))
            .wrap(Cors::permissive())
            .wrap(actix_web::middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(bind_addr)
    .with_context(|| format!("binding {bind_addr}"))?
    .run()
    .await
    .context("running HTTP server")?;

    Ok(())
}
