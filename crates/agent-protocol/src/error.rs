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

use gough_core::Classified;
use thiserror::Error;

/// Failure modes of the three §4.5 flows: enrollment, heartbeat, token
/// refresh, and SSH-CA signing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AgentProtocolError {
    #[error("enrollment key is invalid")]
    InvalidEnrollment,

    #[error("enrollment key expired at {0}")]
    EnrollmentExpired(String),

    #[error("enrollment key was already consumed")]
    EnrollmentConsumed,

    #[error("token expired past its refresh grace window")]
    TokenExpired,

    #[error("token is unknown or was revoked")]
    UnknownToken,

    #[error("agent is suspended: {0}")]
    Suspended(String),

    #[error("requested validity {requested_secs}s exceeds the {max_secs}s maximum")]
    ValidityExceedsMaximum { requested_secs: u64, max_secs: u64 },

    #[error("principal {0} is not among the caller's allowed principals for this resource")]
    PrincipalNotAllowed(String),

    #[error("caller lacks the shell capability on this resource")]
    ShellCapabilityMissing,
}

impl From<AgentProtocolError> for Classified {
    fn from(e: AgentProtocolError) -> Self {
        use AgentProtocolError::*;
        match e {
            InvalidEnrollment | UnknownToken => Classified::invalid(e.to_string()),
            EnrollmentExpired(_) | TokenExpired => Classified::Unauthorized(e.to_string()),
            EnrollmentConsumed => Classified::conflict(e.to_string()),
            Suspended(_) => Classified::Forbidden(e.to_string()),
            ValidityExceedsMaximum { .. } | PrincipalNotAllowed(_) => Classified::invalid(e.to_string()),
            ShellCapabilityMissing => Classified::Forbidden(e.to_string()),
        }
    }
}
