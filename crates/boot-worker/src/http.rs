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

//! The HTTP half of §4.1's boot surface: iPXE script delivery, cloud-init
//! bodies, local image passthrough, and the boot-event sink that both the
//! DHCP/TFTP loops and iPXE's own `http://` GETs report through.

use std::path::{Component, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::Utc;
use gough_core::model::{BootEvent, BootEventType, Machine};
use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::config::WorkerConfig;
use crate::control_client::ControlClient;

pub struct AppState {
    pub control: Arc<ControlClient>,
    pub images_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BootEventBody {
    mac: String,
    ip: Option<String>,
    event_type: BootEventType,
    #[serde(default)]
    details: serde_json::Value,
    status: String,
}

async fn get_ipxe_script(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let filename = path.into_inner();
    let Some(mac_part) = filename.strip_suffix(".ipxe") else {
        return HttpResponse::NotFound().finish();
    };
    let mac = Machine::normalize_mac(mac_part);

    match state.control.boot_script(&mac).await {
        Ok(script) => HttpResponse::Ok().content_type("text/plain").body(script),
        Err(e) => {
            error!(target: "boot_worker::http", "boot script unavailable for {mac}: {e}");
            HttpResponse::ServiceUnavailable().body("#!ipxe\necho boot script unavailable\nshell\n")
        }
    }
}

async fn get_cloud_init(state: web::Data<AppState>, path: web::Path<(String, String)>) -> HttpResponse {
    let (machine_id, part) = path.into_inner();
    if part != "meta-data" && part != "user-data" {
        return HttpResponse::NotFound().finish();
    }
    match state.control.cloud_init(&machine_id, &part).await {
        Ok(content) => HttpResponse::Ok().content_type("text/plain").body(content),
        Err(_) => HttpResponse::NotFound().finish(),
    }
}

/// Serves files under `images_root` read-only, rejecting any path
/// component that would escape it (`..`, absolute components).
async fn get_image(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let requested = path.into_inner();
    let relative = PathBuf::from(&requested);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return HttpResponse::Forbidden().finish();
    }

    let full_path = state.images_root.join(&relative);
    match tokio::fs::read(&full_path).await {
        Ok(bytes) => HttpResponse::Ok().content_type("application/octet-stream").body(bytes),
        Err(_) => HttpResponse::NotFound().finish(),
    }
}

async fn post_boot_event(state: web::Data<AppState>, body: web::Json<BootEventBody>) -> HttpResponse {
    let body = body.into_inner();
    let mac = Machine::normalize_mac(&body.mac);
    let event = BootEvent {
        machine_id: None,
        mac,
        ip: body.ip,
        event_type: body.event_type,
        details: body.details,
        status: body.status,
        timestamp: Utc::now(),
    };
    state.control.report_boot_event(&event).await;
    HttpResponse::Accepted().json(json!({ "accepted": true }))
}

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn run_http_server(config: &WorkerConfig, control: Arc<ControlClient>) -> std::io::Result<()> {
    let images_root = PathBuf::from(&config.tftp_root).join("images");
    let port = config.http_port;

    HttpServer::new(move || {
        let state = web::Data::new(AppState {
            control: control.clone(),
            images_root: images_root.clone(),
        });
        App::new()
            .wrap(Cors::permissive())
            .app_data(state)
            .route("/healthz", web::get().to(healthz))
            .route("/ipxe/{filename}", web::get().to(get_ipxe_script))
            .route("/cloud-init/{machine_id}/{part}", web::get().to(get_cloud_init))
            .route("/images/{path:.*}", web::get().to(get_image))
            .route("/boot-event", web::post().to(post_boot_event))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
