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

//! Admin CRUD over `BootImage`/`BootConfig`, per §3/§6 — the catalog
//! `/internal/boot-script` and `POST /deployments` resolve an image from.

use actix_web::{web, HttpRequest, HttpResponse};
use gough_core::model::{BootConfig, BootImage};
use gough_core::Classified;

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::state::AppState;

pub async fn list_images(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.store.list_boot_images())
}

pub async fn upsert_image(req: HttpRequest, state: web::Data<AppState>, body: web::Json<BootImage>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let image = body.into_inner();
    state.store.upsert_boot_image(image.clone());
    HttpResponse::Ok().json(image)
}

pub async fn get_config(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.store.boot_config(&path.into_inner()) {
        Some(config) => HttpResponse::Ok().json(config),
        None => respond(&Classified::not_found("boot config not found")),
    }
}

pub async fn upsert_config(req: HttpRequest, state: web::Data<AppState>, body: web::Json<BootConfig>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let config = body.into_inner();
    state.store.upsert_boot_config(config.clone());
    HttpResponse::Ok().json(config)
}
