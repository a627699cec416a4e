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

//! `POST /workers/enroll`, `POST /workers/heartbeat`, `GET /workers`, per
//! §4.5/§6. A worker's identity is its own `worker_id`; the shared
//! `WORKER_API_KEY` is the only secret it presents, so re-enrolling with the
//! same id is idempotent (§8 round-trip property) and mints a fresh session
//! token each time.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use gough_core::model::Worker;

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::routes::dto::{WorkerEnrollRequest, WorkerEnrollResponse, WorkerHeartbeatRequest};
use crate::state::AppState;

pub async fn enroll(req: HttpRequest, state: web::Data<AppState>, body: web::Json<WorkerEnrollRequest>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.worker_api_key) {
        return respond(&e);
    }
    let body = body.into_inner();
    let now = Utc::now();
    let session = agent_protocol::issue_session(now);

    let existing = state.store.worker(&body.worker_id);
    let worker = Worker {
        worker_id: body.worker_id.clone(),
        site: body.site,
        dhcp_mode: body.dhcp_mode,
        capabilities: body.capabilities,
        base_url: body.base_url,
        session_token: session.hash.clone(),
        token_expires_at: session.expires_at,
        last_heartbeat_at: existing.as_ref().and_then(|w| w.last_heartbeat_at),
        consecutive_missed_heartbeats: 0,
        suspect: false,
    };
    state.store.upsert_worker(worker);

    HttpResponse::Ok().json(WorkerEnrollResponse {
        worker_id: body.worker_id,
        session_token: session.plaintext,
        token_expires_at: session.expires_at,
    })
}

pub async fn heartbeat(req: HttpRequest, state: web::Data<AppState>, body: web::Json<WorkerHeartbeatRequest>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.worker_api_key) {
        return respond(&e);
    }
    match state.store.record_worker_heartbeat(&body.worker_id, Utc::now()) {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({ "acknowledged": true })),
        Err(e) => respond(&e),
    }
}

pub async fn list(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    HttpResponse::Ok().json(state.store.list_workers())
}
