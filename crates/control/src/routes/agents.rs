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

//! The agent side of §4.5: enrollment-key issuance (admin-only), one-time
//! key exchange for an agent token, heartbeats, token refresh, suspension,
//! and listing.

use actix_web::{web, HttpRequest, HttpResponse};
use agent_protocol::{enroll_new_agent, hash_token, validate_key, IssuedToken, DEFAULT_AGENT_TOKEN_TTL};
use chrono::Utc;
use gough_core::model::{Agent, AgentStatus, EnrollmentKey};
use gough_core::Classified;
use uuid::Uuid;

use crate::auth::{authenticate_agent, require_shared_key};
use crate::error::respond;
use crate::routes::dto::{
    AgentEnrollRequest, AgentEnrollResponse, AgentHeartbeatRequest, AgentHeartbeatResponse,
    CreateEnrollmentKeyRequest, CreateEnrollmentKeyResponse, ListAgentsQuery, SuspendAgentRequest,
    TokenRefreshResponse,
};
use crate::state::AppState;

pub async fn create_enrollment_key(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateEnrollmentKeyRequest>,
) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let body = body.into_inner();
    let now = Utc::now();
    let plaintext = Uuid::new_v4().to_string();
    let key = EnrollmentKey {
        key_id: Uuid::new_v4().to_string(),
        key_hash: hash_token(&plaintext),
        single_use: body.single_use,
        consumed_at: None,
        scope_tags: body.scope_tags,
        expires_at: now + chrono::Duration::seconds(body.ttl_seconds),
        created_at: now,
    };
    let response = CreateEnrollmentKeyResponse {
        key_id: key.key_id.clone(),
        plaintext_key: plaintext,
        expires_at: key.expires_at,
    };
    state.store.create_enrollment_key(key);
    HttpResponse::Created().json(response)
}

pub async fn enroll(state: web::Data<AppState>, body: web::Json<AgentEnrollRequest>) -> HttpResponse {
    let body = body.into_inner();
    let now = Utc::now();

    let Some(key) = state.store.enrollment_key(&body.enrollment_key_id) else {
        return respond(&Classified::not_found(format!("enrollment key {} not found", body.enrollment_key_id)));
    };
    if let Err(e) = validate_key(&key, &body.presented_key, now) {
        return respond(&Classified::from(e));
    }

    let outcome = enroll_new_agent(now);
    let agent = Agent {
        agent_id: outcome.agent_id.clone(),
        machine_id: body.machine_id,
        enrollment_key_id: body.enrollment_key_id.clone(),
        status: AgentStatus::Online,
        quick_stats: Default::default(),
        last_heartbeat_at: Some(now),
        consecutive_missed_heartbeats: 0,
        token_hash: outcome.agent_token.hash.clone(),
        token_expires_at: outcome.agent_token.expires_at,
        suspend_reason: None,
    };
    state.store.upsert_agent(agent);
    state.store.consume_enrollment_key(&body.enrollment_key_id, now);

    HttpResponse::Created().json(AgentEnrollResponse {
        agent_id: outcome.agent_id,
        agent_token: outcome.agent_token.plaintext,
        token_expires_at: outcome.agent_token.expires_at,
    })
}

pub async fn heartbeat(req: HttpRequest, state: web::Data<AppState>, body: web::Json<AgentHeartbeatRequest>) -> HttpResponse {
    let agent = match authenticate_agent(&req, &state.store) {
        Ok(agent) => agent,
        Err(e) => return respond(&e),
    };
    let body = body.into_inner();
    match state.store.record_agent_heartbeat(&agent.agent_id, Utc::now(), body.quick_stats) {
        Ok(_) => HttpResponse::Ok().json(AgentHeartbeatResponse {
            acknowledged: true,
            next_heartbeat_interval_seconds: 30,
        }),
        Err(e) => respond(&e),
    }
}

pub async fn refresh_token(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let agent = match authenticate_agent(&req, &state.store) {
        Ok(agent) => agent,
        Err(e) => return respond(&e),
    };
    let now = Utc::now();
    let fresh = IssuedToken::issue(now, DEFAULT_AGENT_TOKEN_TTL);
    let mut updated = agent;
    updated.token_hash = fresh.hash.clone();
    updated.token_expires_at = fresh.expires_at;
    state.store.upsert_agent(updated);

    HttpResponse::Ok().json(TokenRefreshResponse {
        agent_token: fresh.plaintext,
        token_expires_at: fresh.expires_at,
    })
}

pub async fn suspend(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SuspendAgentRequest>,
) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    match state.store.suspend_agent(&path.into_inner(), body.into_inner().reason) {
        Ok(agent) => HttpResponse::Ok().json(agent),
        Err(e) => respond(&e),
    }
}

pub async fn list(req: HttpRequest, state: web::Data<AppState>, query: web::Query<ListAgentsQuery>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    HttpResponse::Ok().json(state.store.list_agents(query.into_inner().status))
}
