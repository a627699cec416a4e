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

//! §4.5 "Enrollment": an admin-issued [`EnrollmentKey`] is exchanged once
//! for an `agent_id` + short-TTL `agent_token`. This module only validates
//! the key and mints the token; persistence of the new `Agent` record is
//! the caller's (`control`'s) job.

use chrono::{DateTime, Utc};
use gough_core::model::EnrollmentKey;
use uuid::Uuid;

use crate::error::AgentProtocolError;
use crate::token::{hash_token, IssuedToken, DEFAULT_AGENT_TOKEN_TTL};

/// What the agent sends to `POST /agents/enroll`, per §6.
#[derive(Debug, Clone)]
pub struct EnrollmentRequest {
    pub presented_key: String,
    pub name: String,
    pub agent_type: String,
    pub capabilities: Vec<String>,
    pub tags: Vec<String>,
}

/// What `POST /agents/enroll` returns on success, per §4.5.
#[derive(Debug, Clone)]
pub struct EnrollmentOutcome {
    pub agent_id: String,
    pub agent_token: IssuedToken,
}

/// Validates `key` against the presented plaintext and the clock, per §4.5:
/// not expired, and — if single-use — not already consumed. Does not mutate
/// `key`; the caller marks it consumed after a successful enrollment.
pub fn validate_key(
    key: &EnrollmentKey,
    presented_key: &str,
    now: DateTime<Utc>,
) -> Result<(), AgentProtocolError> {
    if hash_token(presented_key) != key.key_hash {
        return Err(AgentProtocolError::InvalidEnrollment);
    }
    if key.is_expired(now) {
        return Err(AgentProtocolError::EnrollmentExpired(key.expires_at.to_rfc3339()));
    }
    if key.is_consumed() {
        return Err(AgentProtocolError::EnrollmentConsumed);
    }
    Ok(())
}

/// Completes enrollment for an already-validated key: mints a fresh
/// `agent_id` and `agent_token`. A caller binding onto an *existing* agent
/// (re-enrollment) should skip this and mint only a fresh token instead.
pub fn enroll_new_agent(now: DateTime<Utc>) -> EnrollmentOutcome {
    EnrollmentOutcome {
        agent_id: Uuid::new_v4().to_string(),
        agent_token: IssuedToken::issue(now, DEFAULT_AGENT_TOKEN_TTL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use gough_core::model::EnrollmentKey;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn key(now: DateTime<Utc>, plaintext: &str) -> EnrollmentKey {
        EnrollmentKey {
            key_id: "key-1".into(),
            key_hash: hash_token(plaintext),
            single_use: true,
            consumed_at: None,
            scope_tags: BTreeSet::new(),
            expires_at: now + Duration::hours(1),
            created_at: now,
        }
    }

    #[test]
    fn valid_unexpired_unconsumed_key_is_accepted() {
        let now = Utc::now();
        let k = key(now, "shared-secret");
        assert!(validate_key(&k, "shared-secret", now).is_ok());
    }

    #[test]
    fn wrong_plaintext_is_invalid_enrollment() {
        let now = Utc::now();
        let k = key(now, "shared-secret");
        let err = validate_key(&k, "guess", now).unwrap_err();
        assert_eq!(err, AgentProtocolError::InvalidEnrollment);
    }

    #[test]
    fn expired_key_is_rejected() {
        let now = Utc::now();
        let k = key(now - Duration::hours(2), "shared-secret");
        let err = validate_key(&k, "shared-secret", now).unwrap_err();
        assert!(matches!(err, AgentProtocolError::EnrollmentExpired(_)));
    }

    #[test]
    fn consumed_single_use_key_is_rejected() {
        let now = Utc::now();
        let mut k = key(now, "shared-secret");
        k.consumed_at = Some(now);
        let err = validate_key(&k, "shared-secret", now).unwrap_err();
        assert_eq!(err, AgentProtocolError::EnrollmentConsumed);
    }

    #[test]
    fn multi_use_key_is_not_rejected_after_being_marked_consumed_once() {
        let now = Utc::now();
        let mut k = key(now, "shared-secret");
        k.single_use = false;
        k.consumed_at = Some(now);
        assert!(validate_key(&k, "shared-secret", now).is_ok());
    }

    #[test]
    fn enrolling_mints_a_distinct_agent_id_and_token_each_time() {
        let now = Utc::now();
        let a = enroll_new_agent(now);
        let b = enroll_new_agent(now);
        assert_ne!(a.agent_id, b.agent_id);
        assert_ne!(a.agent_token.plaintext, b.agent_token.plaintext);
    }
}
