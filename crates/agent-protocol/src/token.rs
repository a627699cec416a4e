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

//! Short-TTL bearer tokens shared by the worker-session and agent-token
//! flows of §4.5. Only a SHA-256 hash of the token is ever persisted;
//! [`IssuedToken::plaintext`] is returned to the caller exactly once, at
//! issuance or refresh time.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::AgentProtocolError;

/// Default agent-token TTL, per §4.5: 60 minutes.
pub const DEFAULT_AGENT_TOKEN_TTL: Duration = Duration::minutes(60);

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Hashes a plaintext token the way every stored token is compared: a
/// salt-free SHA-256 digest is sufficient here because the token itself is
/// high-entropy random material, not a user-chosen password.
pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex_encode(&hasher.finalize())
}

/// A freshly minted token, before its hash is persisted by the caller.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub plaintext: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        let plaintext = random_token();
        let hash = hash_token(&plaintext);
        Self {
            plaintext,
            hash,
            expires_at: now + ttl,
        }
    }
}

/// Validates `presented` against `stored_hash`/`expires_at`, allowing a
/// refresh within a grace window equal to the token's own TTL (§4.5 "Token
/// refresh"). Returns `Ok(())` if the token may still be used or refreshed;
/// `TokenExpired` once the caller is past the grace window.
pub fn check_presented_token(
    presented: &str,
    stored_hash: &str,
    expires_at: DateTime<Utc>,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<(), AgentProtocolError> {
    if hash_token(presented) != stored_hash {
        return Err(AgentProtocolError::UnknownToken);
    }
    let grace_deadline = expires_at + ttl;
    if now > grace_deadline {
        return Err(AgentProtocolError::TokenExpired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hash_is_deterministic_and_not_the_plaintext() {
        let h1 = hash_token("sekret");
        let h2 = hash_token("sekret");
        assert_eq!(h1, h2);
        assert_ne!(h1, "sekret");
    }

    #[test]
    fn issued_tokens_are_unique_and_hash_matches() {
        let now = Utc::now();
        let a = IssuedToken::issue(now, DEFAULT_AGENT_TOKEN_TTL);
        let b = IssuedToken::issue(now, DEFAULT_AGENT_TOKEN_TTL);
        assert_ne!(a.plaintext, b.plaintext);
        assert_eq!(hash_token(&a.plaintext), a.hash);
    }

    #[test]
    fn token_within_ttl_is_accepted() {
        let now = Utc::now();
        let issued = IssuedToken::issue(now, Duration::minutes(60));
        assert!(check_presented_token(
            &issued.plaintext,
            &issued.hash,
            issued.expires_at,
            Duration::minutes(60),
            now + Duration::minutes(30),
        )
        .is_ok());
    }

    #[test]
    fn token_within_grace_window_past_expiry_is_accepted() {
        let now = Utc::now();
        let issued = IssuedToken::issue(now, Duration::minutes(60));
        // 90 minutes in: 30 minutes past expiry, inside the 60-minute grace window.
        assert!(check_presented_token(
            &issued.plaintext,
            &issued.hash,
            issued.expires_at,
            Duration::minutes(60),
            now + Duration::minutes(90),
        )
        .is_ok());
    }

    #[test]
    fn token_past_grace_window_is_expired() {
        let now = Utc::now();
        let issued = IssuedToken::issue(now, Duration::minutes(60));
        let err = check_presented_token(
            &issued.plaintext,
            &issued.hash,
            issued.expires_at,
            Duration::minutes(60),
            now + Duration::minutes(200),
        )
        .unwrap_err();
        assert_eq!(err, AgentProtocolError::TokenExpired);
    }

    #[test]
    fn wrong_plaintext_is_an_unknown_token() {
        let now = Utc::now();
        let issued = IssuedToken::issue(now, DEFAULT_AGENT_TOKEN_TTL);
        let err = check_presented_token(
            "not-the-token",
            &issued.hash,
            issued.expires_at,
            DEFAULT_AGENT_TOKEN_TTL,
            now,
        )
        .unwrap_err();
        assert_eq!(err, AgentProtocolError::UnknownToken);
    }
}
