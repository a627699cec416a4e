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

//! §3 "Worker" lifecycle: enrolled once with a long-lived shared key
//! (`WORKER_API_KEY`), session token refreshed implicitly by heartbeats,
//! re-enrollment with the same key is idempotent on `worker_id` (§8
//! round-trip property). 5 consecutive missed heartbeats marks the worker
//! suspect and it must re-enroll.

use chrono::{DateTime, Utc};

use crate::error::AgentProtocolError;
use crate::token::{hash_token, IssuedToken};

/// Default worker session-token TTL. The spec leaves the exact figure
/// unspecified; chosen long enough that a missed heartbeat or two doesn't
/// immediately expire the session, short enough to bound a stolen token's
/// useful life.
pub const DEFAULT_WORKER_SESSION_TTL: chrono::Duration = chrono::Duration::hours(12);

/// Validates a worker's presented `WORKER_API_KEY` against its provisioned
/// hash. The `worker_id` this key is bound to is a lookup the caller
/// performs (by key hash or by the worker's declared id); this function
/// only confirms the secret matches.
pub fn validate_api_key(presented_key: &str, stored_key_hash: &str) -> Result<(), AgentProtocolError> {
    if hash_token(presented_key) == stored_key_hash {
        Ok(())
    } else {
        Err(AgentProtocolError::InvalidEnrollment)
    }
}

/// Mints a fresh session token for an already-validated worker. Calling
/// this twice for the same `worker_id` within the key's validity window is
/// exactly how re-enrollment stays idempotent: same `worker_id`, new token
/// each time.
pub fn issue_session(now: DateTime<Utc>) -> IssuedToken {
    IssuedToken::issue(now, DEFAULT_WORKER_SESSION_TTL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn matching_key_validates() {
        let hash = hash_token("worker-shared-key");
        assert!(validate_api_key("worker-shared-key", &hash).is_ok());
    }

    #[test]
    fn mismatched_key_is_invalid_enrollment() {
        let hash = hash_token("worker-shared-key");
        let err = validate_api_key("wrong-key", &hash).unwrap_err();
        assert_eq!(err, AgentProtocolError::InvalidEnrollment);
    }

    #[test]
    fn re_enrolling_issues_a_fresh_token_each_time() {
        let now = Utc::now();
        let first = issue_session(now);
        let second = issue_session(now);
        assert_ne!(first.plaintext, second.plaintext);
    }
}
