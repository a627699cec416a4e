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

//! The error taxonomy every component in the workspace classifies its
//! failures into. The lowest layer able to classify an error does so;
//! higher layers may attach context with [`Classified::context`] but never
//! re-bucket an error into a different category.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single error category. Each carries its own recovery semantics,
/// documented on the variant.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Classified {
    /// Network, timeout, or backend 5xx. Retried with backoff by the caller;
    /// only surfaced once retries are exhausted.
    #[error("transient error: {0}")]
    Transient(String),

    /// Duplicate job, duplicate enrollment, CAS failure. Never retried
    /// automatically; the caller must reconcile.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed input, a cycle in an egg dependency graph, an architecture
    /// mismatch. Never retried.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but lacks the capability for this action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is being rate limited; callers should respect `retry_after`.
    #[error("rate limited, retry after {retry_after_secs}s: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// An invariant was violated (e.g. progress went backwards). The owning
    /// aggregate (job, machine) is marked failed and an audit event is
    /// emitted by the caller.
    #[error("fatal invariant violation: {0}")]
    Fatal(String),
}

impl Classified {
    /// Stable machine-readable code for this category, used in HTTP bodies
    /// and CLI `--json` output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transient(_) => "Transient",
            Self::Conflict(_) => "Conflict",
            Self::Invalid(_) => "Invalid",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "NotFound",
            Self::RateLimited { .. } => "RateLimited",
            Self::Fatal(_) => "Fatal",
        }
    }

    /// Whether this category is safe for the caller to retry without
    /// operator intervention.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }
}

/// Wire body for an errored HTTP response: `{error: code, message: human}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl From<&Classified> for ErrorBody {
    fn from(e: &Classified) -> Self {
        Self {
            error: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

pub type Result<T> = std::result::Result<T, Classified>;
