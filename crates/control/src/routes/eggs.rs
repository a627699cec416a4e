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

//! Admin CRUD over the egg/group catalog, plus `POST /eggs/render`: the
//! stateless preview of what `resolve` + `render_cloud_init` would produce
//! for a given machine, per §4.3/§6.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use egg_engine::resolve::MachineProfile;
use egg_engine::{render_cloud_init, resolve};
use gough_core::model::{Egg, EggGroup};
use gough_core::Classified;

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::routes::dto::{RenderRequest, RenderResponse};
use crate::state::AppState;

pub async fn list_eggs(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.list_eggs())
}

pub async fn get_egg(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.store.egg(&path.into_inner()) {
        Some(egg) => HttpResponse::Ok().json(egg),
        None => respond(&Classified::not_found("egg not found")),
    }
}

pub async fn upsert_egg(req: HttpRequest, state: web::Data<AppState>, body: web::Json<Egg>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let mut egg = body.into_inner();
    egg.updated_at = Utc::now();
    state.store.upsert_egg(egg.clone());
    HttpResponse::Ok().json(egg)
}

pub async fn delete_egg(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    if state.store.delete_egg(&path.into_inner()) {
        HttpResponse::NoContent().finish()
    } else {
        respond(&Classified::not_found("egg not found"))
    }
}

pub async fn list_groups(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.list_groups())
}

pub async fn get_group(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.store.group(&path.into_inner()) {
        Some(group) => HttpResponse::Ok().json(group),
        None => respond(&Classified::not_found("egg group not found")),
    }
}

pub async fn upsert_group(req: HttpRequest, state: web::Data<AppState>, body: web::Json<EggGroup>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let mut group = body.into_inner();
    group.updated_at = Utc::now();
    state.store.upsert_group(group.clone());
    HttpResponse::Ok().json(group)
}

pub async fn delete_group(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    if state.store.delete_group(&path.into_inner()) {
        HttpResponse::NoContent().finish()
    } else {
        respond(&Classified::not_found("egg group not found"))
    }
}

pub async fn render(state: web::Data<AppState>, body: web::Json<RenderRequest>) -> HttpResponse {
    let body = body.into_inner();
    let Some(machine) = state.store.machine(&body.machine_id) else {
        return respond(&Classified::not_found(format!("machine {} not found", body.machine_id)));
    };
    let catalog = state.store.egg_catalog_snapshot();
    let profile = MachineProfile {
        architecture: machine.architecture,
        memory_mb: machine.memory_mb,
        storage_gb: machine.storage_gb,
    };
    let resolved = match resolve(&catalog, &body.eggs, profile) {
        Ok(eggs) => eggs,
        Err(e) => return respond(&Classified::from(e)),
    };
    match render_cloud_init(&resolved) {
        Ok(cloud_init) => HttpResponse::Ok().json(RenderResponse { cloud_init }),
        Err(e) => respond(&Classified::from(e)),
    }
}
