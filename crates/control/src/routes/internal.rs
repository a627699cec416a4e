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

//! The `/internal/*` routes boot-workers call, per §4.1/§6: the iPXE
//! script decision, cloud-init passthrough, presigned image URLs, and the
//! boot-event sink that drives the §4.2 state machine from PXE-side
//! ground truth.

use std::time::Duration;

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use control_machine::{render_ipxe_script, ScriptContext, Trigger};
use gough_core::model::{BootEvent, BootEventType, DeploymentStatus, Machine, MachineStatus, PresignMethod};
use gough_core::{BlobRef, Classified};
use log::{info, warn};

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::routes::dto::{BootEventRequest, BootScriptQuery, BootScriptResponse, CloudInitResponse, ImageUrlResponse};
use crate::state::AppState;

const PRESIGN_TTL: Duration = Duration::from_secs(5 * 60);

pub async fn boot_script(req: HttpRequest, state: web::Data<AppState>, query: web::Query<BootScriptQuery>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.worker_api_key) {
        return respond(&e);
    }

    let now = Utc::now();
    let mac = Machine::normalize_mac(&query.mac);
    let was_unknown = state.store.machine_by_mac(&mac).is_none();
    let machine = state.store.discover_or_touch(&mac, now);

    if was_unknown {
        let _ = state
            .store
            .transition_machine(&machine.system_id, Trigger::DhcpRequestUnknownMac, now);
        state.store.append_event(BootEvent {
            machine_id: Some(machine.system_id.clone()),
            mac: mac.clone(),
            ip: None,
            event_type: BootEventType::DhcpRequest,
            details: serde_json::json!({}),
            status: "ok".into(),
            timestamp: now,
        });
    }

    let machine = state.store.machine(&machine.system_id).unwrap_or(machine);
    let active_job = state.store.active_job_for_machine(&machine.system_id);
    let image = machine
        .boot_config
        .as_ref()
        .and_then(|cfg| state.store.boot_config(cfg))
        .and_then(|cfg| state.store.boot_image(&cfg.default_image))
        .or_else(|| state.store.list_boot_images().into_iter().next());

    let worker_base_url = query
        .worker_id
        .as_deref()
        .and_then(|id| state.store.worker(id))
        .map(|w| w.base_url)
        .unwrap_or_default();

    let ctx = ScriptContext {
        mac: &mac,
        status: machine.status,
        active_job_status: active_job.as_ref().map(|j| j.status),
        active_job_error: active_job.as_ref().and_then(|j| j.error_message.as_deref()),
        image: image.as_ref(),
        reimage_requested: state.store.reimage_requested(&machine.system_id),
        worker_base_url: &worker_base_url,
    };
    let script = render_ipxe_script(&ctx);

    HttpResponse::Ok().json(BootScriptResponse {
        script,
        machine_id: machine.system_id,
        status: format!("{:?}", machine.status).to_lowercase(),
    })
}

pub async fn cloud_init_meta_data(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.worker_api_key) {
        return respond(&e);
    }
    let machine_id = path.into_inner();
    let Some(machine) = state.store.machine(&machine_id) else {
        return respond(&Classified::not_found(format!("machine {machine_id} not found")));
    };
    let content = format!(
        "instance-id: {}\nlocal-hostname: {}\n",
        machine.system_id,
        machine.hostname.as_deref().unwrap_or(&machine.system_id)
    );
    HttpResponse::Ok().json(CloudInitResponse { content })
}

pub async fn cloud_init_user_data(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.worker_api_key) {
        return respond(&e);
    }
    let machine_id = path.into_inner();
    let Some(job) = state.store.active_job_for_machine(&machine_id) else {
        return respond(&Classified::not_found(format!(
            "no active deployment job for machine {machine_id}"
        )));
    };
    let content = job.rendered_cloud_init.unwrap_or_else(|| "#cloud-config\n{}\n".to_string());
    HttpResponse::Ok().json(CloudInitResponse { content })
}

pub async fn image_url(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.worker_api_key) {
        return respond(&e);
    }
    let key = path.into_inner();
    let blob = BlobRef {
        backend_id: "images".to_string(),
        bucket: "gough-boot-images".to_string(),
        key,
    };
    match state.blobs.presign(&blob, PRESIGN_TTL, PresignMethod::Get).await {
        Ok(url) => HttpResponse::Ok().json(ImageUrlResponse {
            url,
            expires_in: PRESIGN_TTL.as_secs(),
        }),
        Err(e) => respond(&e),
    }
}

/// Forwards a booting machine's progress event into the append-only log
/// and, where the event itself carries a state-machine trigger (machine
/// discovery, commissioning completion), drives that transition too. Most
/// boot events are ground truth the deployment orchestrator's own poll
/// loop consumes (§4.4); this handler's job is only to persist them and to
/// apply the couple of transitions that don't go through a `DeploymentJob`.
pub async fn boot_event(req: HttpRequest, state: web::Data<AppState>, body: web::Json<BootEventRequest>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.worker_api_key) {
        return respond(&e);
    }
    let body = body.into_inner();
    let now = Utc::now();
    let mac = Machine::normalize_mac(&body.mac);
    let machine = state.store.discover_or_touch(&mac, now);

    let event = BootEvent {
        machine_id: Some(machine.system_id.clone()),
        mac: mac.clone(),
        ip: body.ip,
        event_type: body.event_type,
        details: body.details.clone(),
        status: body.status,
        timestamp: now,
    };
    state.store.append_event(event);

    if body.event_type == BootEventType::OsInstalled && machine.status == MachineStatus::Commissioning {
        match state
            .store
            .transition_machine(&machine.system_id, Trigger::CommissionComplete, now)
        {
            Ok(_) => {
                let mut updated = state.store.machine(&machine.system_id).unwrap_or(machine.clone());
                updated.hardware_info = Some(body.details);
                updated.updated_at = now;
                state.store.upsert_machine(updated);
                info!(target: "control::routes", "machine {} commissioned", machine.system_id);
            }
            Err(e) => warn!(target: "control::routes", "commission-complete transition rejected for {}: {e}", machine.system_id),
        }
    }

    if body.event_type == BootEventType::Error {
        if let Some(job) = state.store.active_job_for_machine(&machine.system_id) {
            if !job.status.is_terminal() {
                let message = body
                    .details
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("boot-side error event")
                    .to_string();
                let _ = state.store.update_job(&job.job_id, |j| {
                    j.status = DeploymentStatus::Failed;
                    j.error_message = Some(message);
                    j.completed_at = Some(now);
                });
                match state
                    .store
                    .transition_machine(&machine.system_id, Trigger::DeploymentFailed, now)
                {
                    Ok(_) => info!(target: "control::routes", "machine {} deployment failed via boot event", machine.system_id),
                    Err(e) => warn!(target: "control::routes", "deployment-failed transition rejected for {}: {e}", machine.system_id),
                }
            }
        }
    }

    HttpResponse::Accepted().json(serde_json::json!({ "accepted": true }))
}
