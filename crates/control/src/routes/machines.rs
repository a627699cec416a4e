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

//! Admin-facing machine inventory and the three commands that drive
//! `control-machine`'s transitions outside of a boot event or a deployment
//! run: `commission`, `release`, and `hard-reset`, per §4.2/§6.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use control_machine::Trigger;
use gough_core::Classified;

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::routes::dto::CommissionRequest;
use crate::state::AppState;

pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.list_machines())
}

pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.store.machine(&path.into_inner()) {
        Some(machine) => HttpResponse::Ok().json(machine),
        None => respond(&Classified::not_found("machine not found")),
    }
}

pub async fn commission(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CommissionRequest>,
) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let system_id = path.into_inner();
    let now = Utc::now();
    match state.store.transition_machine(&system_id, Trigger::Commission, now) {
        Ok(machine) => {
            let body = body.into_inner();
            if !body.hardware_info.is_null() {
                if let Some(mut updated) = state.store.machine(&machine.system_id) {
                    updated.hardware_info = Some(body.hardware_info);
                    updated.updated_at = now;
                    state.store.upsert_machine(updated.clone());
                    return HttpResponse::Ok().json(updated);
                }
            }
            HttpResponse::Ok().json(machine)
        }
        Err(e) => respond(&e),
    }
}

pub async fn release(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    match state.store.transition_machine(&path.into_inner(), Trigger::Release, Utc::now()) {
        Ok(machine) => HttpResponse::Ok().json(machine),
        Err(e) => respond(&e),
    }
}

pub async fn hard_reset(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let system_id = path.into_inner();
    state.store.clear_reimage(&system_id);
    match state.store.transition_machine(&system_id, Trigger::HardReset, Utc::now()) {
        Ok(machine) => HttpResponse::Ok().json(machine),
        Err(e) => respond(&e),
    }
}

pub async fn request_reimage(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let system_id = path.into_inner();
    if state.store.machine(&system_id).is_none() {
        return respond(&Classified::not_found("machine not found"));
    }
    state.store.request_reimage(&system_id);
    HttpResponse::Ok().json(serde_json::json!({ "reimage_requested": true }))
}
