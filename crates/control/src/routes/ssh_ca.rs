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

//! `POST /ssh-ca/sign`, per §4.5/§6. Full user authentication is outside
//! this crate's scope (§1 non-goals); the admin shared key stands in for an
//! external identity provider, and the caller-supplied `user_email` is who
//! the capability check and the certificate's `key_id` are resolved against.

use actix_web::{web, HttpRequest, HttpResponse};
use agent_protocol::{sign_certificate, validate_sign_request, SignRequest};
use chrono::Utc;
use gough_core::{AuditEvent, Classified, Severity};

use crate::auth::require_shared_key;
use crate::error::respond;
use crate::routes::dto::{SshCaSignRequest, SshCaSignResponse};
use crate::state::AppState;
use crate::teams::resolve_caller_context;

pub async fn sign(req: HttpRequest, state: web::Data<AppState>, body: web::Json<SshCaSignRequest>) -> HttpResponse {
    if let Err(e) = require_shared_key(&req, &state.config.admin_api_key) {
        return respond(&e);
    }
    let body = body.into_inner();
    let now = Utc::now();

    let caller = resolve_caller_context(&state.teams, &state.store, &body.user_email, &body.resource_type, &body.resource_id);
    let resource_ref = format!("{}:{}", body.resource_type, body.resource_id);
    let sign_req = SignRequest {
        user_public_key: body.user_public_key,
        principals: body.principals,
        validity_seconds: body.validity_seconds,
        resource_ref: resource_ref.clone(),
    };

    if let Err(e) = validate_sign_request(&sign_req, &caller, state.config.max_ssh_cert_validity_secs) {
        let _ = state
            .audit
            .append(AuditEvent {
                event_type: "cert.csr_reject".to_string(),
                severity: Severity::Warning,
                actor: body.user_email.clone(),
                resource_ref: resource_ref.clone(),
                details: serde_json::json!({ "reason": e.to_string(), "validity_seconds": sign_req.validity_seconds }),
                timestamp: now,
            })
            .await;
        return respond(&Classified::from(e));
    }

    let cert = match sign_certificate(&state.ssh_ca, &sign_req, &caller, now) {
        Ok(cert) => cert,
        Err(e) => return respond(&Classified::invalid(format!("certificate signing failed: {e}"))),
    };

    let certificate = match cert.to_openssh() {
        Ok(text) => text,
        Err(e) => return respond(&Classified::fatal(format!("encoding signed certificate failed: {e}"))),
    };

    let _ = state
        .audit
        .append(AuditEvent {
            event_type: "cert.csr_issue".to_string(),
            severity: Severity::Info,
            actor: body.user_email.clone(),
            resource_ref,
            details: serde_json::json!({ "principals": sign_req.principals, "validity_seconds": sign_req.validity_seconds }),
            timestamp: now,
        })
        .await;

    HttpResponse::Ok().json(SshCaSignResponse {
        certificate,
        key_id: agent_protocol::build_key_id(&body.user_email, &format!("{}:{}", body.resource_type, body.resource_id), now),
        valid_before: now.timestamp() as u64 + sign_req.validity_seconds,
    })
}
