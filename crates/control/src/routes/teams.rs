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

//! Admin CRUD over §3's capability model: teams and the resource
//! assignments the SSH-CA sub-protocol (§4.5) checks against.

use actix_web::{web, HttpRequest, HttpResponse};
use gough_core::model::{ResourceAssignment, ResourceTeam};
use gough_core::Classified;

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::state::AppState;

pub async fn list(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.teams.list())
}

pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.teams.get(&path.into_inner()) {
        Some(team) => HttpResponse::Ok().json(team),
        None => respond(&Classified::not_found("team not found")),
    }
}

pub async fn upsert(req: HttpRequest, state: web::Data<AppState>, body: web::Json<ResourceTeam>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let team = body.into_inner();
    state.teams.upsert(team.clone());
    HttpResponse::Ok().json(team)
}

pub async fn assign(req: HttpRequest, state: web::Data<AppState>, body: web::Json<ResourceAssignment>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let assignment = body.into_inner();
    state.store.upsert_assignment(assignment.clone());
    HttpResponse::Ok().json(assignment)
}

pub async fn assignments_for(state: web::Data<AppState>, path: web::Path<(String, String)>) -> HttpResponse {
    let (resource_type, resource_id) = path.into_inner();
    HttpResponse::Ok().json(state.store.assignments_for(&resource_type, &resource_id))
}
