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

//! The SSH CA sub-protocol of §4.5: one-time CA keypair setup (private key
//! lives in [`gough_core::Secrets`], never here), and `POST /ssh-ca/sign`,
//! which checks the caller's `shell` capability, the requested validity
//! against a configured maximum, and that every requested principal is a
//! subset of the caller's allowed principals for the resource (§8 property
//! 5), before asking the CA key to sign a certificate.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use ssh_key::certificate::{Builder, CertType};
use ssh_key::{Algorithm, Certificate, HashAlg, PrivateKey, PublicKey};

use crate::error::AgentProtocolError;

/// Default maximum certificate validity, per §4.5: 8 hours.
pub const DEFAULT_MAX_VALIDITY_SECONDS: u64 = 8 * 60 * 60;

/// The CA's keypair. The private key is handed to [`Secrets`] for storage
/// immediately after generation and reconstructed from there on every
/// subsequent signing call — this type never persists itself.
///
/// [`Secrets`]: gough_core::Secrets
#[derive(Debug)]
pub struct CaKeypair(PrivateKey);

impl CaKeypair {
    /// One-time setup: an RSA-4096 keypair, per §4.5's "recommended ≥4096-bit
    /// RSA or equivalent".
    pub fn generate() -> Result<Self, ssh_key::Error> {
        let key = PrivateKey::random(&mut OsRng, Algorithm::Rsa { hash: Some(HashAlg::Sha512) })?;
        Ok(Self(key))
    }

    pub fn from_openssh(pem: &str) -> Result<Self, ssh_key::Error> {
        Ok(Self(PrivateKey::from_openssh(pem)?))
    }

    pub fn to_openssh(&self) -> Result<String, ssh_key::Error> {
        Ok(self.0.to_openssh(ssh_key::LineEnding::LF)?.to_string())
    }

    pub fn public_key_openssh(&self) -> Result<String, ssh_key::Error> {
        self.0.public_key().to_openssh()
    }
}

/// The caller-side capability context a sign request is checked against,
/// resolved by `control` from the §3 capability model before this module
/// ever sees the request.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub has_shell_capability: bool,
    pub allowed_principals: Vec<String>,
    pub user_email: String,
}

/// `POST /ssh-ca/sign`'s body, per §6.
#[derive(Debug, Clone)]
pub struct SignRequest {
    pub user_public_key: String,
    pub principals: Vec<String>,
    pub validity_seconds: u64,
    pub resource_ref: String,
}

/// Builds the `key_id = user_email@resource-timestamp` format mandated by
/// §4.5, grounded on the Python original's `ssh_ca.py`.
pub fn build_key_id(user_email: &str, resource_ref: &str, now: DateTime<Utc>) -> String {
    format!("{user_email}@{resource_ref}-{}", now.timestamp())
}

/// Checks the request against the caller's capability, the configured
/// validity maximum, and the caller's allowed-principal set — every check
/// §8 property 5 and scenario S5 require, before any signing is attempted.
pub fn validate_sign_request(
    req: &SignRequest,
    caller: &CallerContext,
    max_validity_seconds: u64,
) -> Result<(), AgentProtocolError> {
    if !caller.has_shell_capability {
        return Err(AgentProtocolError::ShellCapabilityMissing);
    }
    if req.validity_seconds > max_validity_seconds {
        return Err(AgentProtocolError::ValidityExceedsMaximum {
            requested_secs: req.validity_seconds,
            max_secs: max_validity_seconds,
        });
    }
    for principal in &req.principals {
        if !caller.allowed_principals.iter().any(|p| p == principal) {
            return Err(AgentProtocolError::PrincipalNotAllowed(principal.clone()));
        }
    }
    Ok(())
}

/// Signs `req` with `ca`, assuming [`validate_sign_request`] already passed.
/// Every call here is expected to be paired with an audit event by the
/// caller (`cert.csr_issue` on success), per §4.5/§6.
pub fn sign_certificate(
    ca: &CaKeypair,
    req: &SignRequest,
    caller: &CallerContext,
    now: DateTime<Utc>,
) -> Result<Certificate, ssh_key::Error> {
    let user_key = PublicKey::from_openssh(&req.user_public_key)?;
    let valid_after = now.timestamp() as u64;
    let valid_before = valid_after + req.validity_seconds;

    let mut builder = Builder::new_with_random_nonce(&mut OsRng, user_key, valid_after, valid_before)?;
    builder = builder.cert_type(CertType::User)?;
    builder = builder.key_id(build_key_id(&caller.user_email, &req.resource_ref, now))?;
    for principal in &req.principals {
        builder = builder.valid_principal(principal)?;
    }
    builder.sign(&ca.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn caller() -> CallerContext {
        CallerContext {
            has_shell_capability: true,
            allowed_principals: vec!["ubuntu".into(), "admin".into()],
            user_email: "alice@example.com".into(),
        }
    }

    fn req(validity_seconds: u64, principals: Vec<&str>) -> SignRequest {
        SignRequest {
            user_public_key: String::new(),
            principals: principals.into_iter().map(String::from).collect(),
            validity_seconds,
            resource_ref: "vm:v-1".into(),
        }
    }

    #[test]
    fn validity_within_maximum_is_accepted() {
        let r = req(4 * 60 * 60, vec!["ubuntu"]);
        assert!(validate_sign_request(&r, &caller(), DEFAULT_MAX_VALIDITY_SECONDS).is_ok());
    }

    #[test]
    fn validity_over_maximum_is_rejected() {
        // S5: 24h requested against an 8h maximum.
        let r = req(24 * 60 * 60, vec!["ubuntu"]);
        let err = validate_sign_request(&r, &caller(), DEFAULT_MAX_VALIDITY_SECONDS).unwrap_err();
        assert_eq!(
            err,
            AgentProtocolError::ValidityExceedsMaximum {
                requested_secs: 24 * 60 * 60,
                max_secs: DEFAULT_MAX_VALIDITY_SECONDS,
            }
        );
    }

    #[test]
    fn principal_outside_allowed_set_is_rejected() {
        let r = req(60, vec!["root"]);
        let err = validate_sign_request(&r, &caller(), DEFAULT_MAX_VALIDITY_SECONDS).unwrap_err();
        assert_eq!(err, AgentProtocolError::PrincipalNotAllowed("root".into()));
    }

    #[test]
    fn missing_shell_capability_is_rejected_before_other_checks() {
        let mut c = caller();
        c.has_shell_capability = false;
        let r = req(24 * 60 * 60, vec!["root"]);
        let err = validate_sign_request(&r, &c, DEFAULT_MAX_VALIDITY_SECONDS).unwrap_err();
        assert_eq!(err, AgentProtocolError::ShellCapabilityMissing);
    }

    #[test]
    fn key_id_has_the_mandated_shape() {
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let id = build_key_id("alice@example.com", "vm:v-1", now);
        assert_eq!(id, format!("alice@example.com@vm:v-1-{}", now.timestamp()));
    }
}
