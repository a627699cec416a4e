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

//! C5: enrollment, heartbeat, token-refresh and SSH-CA signing, per spec
//! §4.5. Every function here is pure given its inputs — `control` owns the
//! `EnrollmentKey`/`Worker`/`Agent` records and the clock; this crate only
//! validates and mints.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod enrollment;
pub mod error;
pub mod heartbeat;
pub mod ssh_ca;
pub mod token;
pub mod worker_session;

pub use enrollment::{enroll_new_agent, validate_key, EnrollmentOutcome, EnrollmentRequest};
pub use error::AgentProtocolError;
pub use heartbeat::{is_down, missed_count, record_heartbeat, HeartbeatOutcome, DEFAULT_MISSED_THRESHOLD};
pub use ssh_ca::{
    build_key_id, sign_certificate, validate_sign_request, CaKeypair, CallerContext, SignRequest,
    DEFAULT_MAX_VALIDITY_SECONDS,
};
pub use token::{check_presented_token, hash_token, IssuedToken, DEFAULT_AGENT_TOKEN_TTL};
pub use worker_session::{issue_session, validate_api_key, DEFAULT_WORKER_SESSION_TTL};
