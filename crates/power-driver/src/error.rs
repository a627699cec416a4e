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

/// Normalized power-backend errors, per §4.6: the orchestrator never sees
/// IPMI-vs-Redfish-vs-WoL specific codes, only these four.
#[derive(Error, Debug)]
pub enum PowerError {
    #[error("power operation timed out against {bmc}")]
    PowerTimeout { bmc: String },

    #[error("power backend rejected credentials for {bmc}")]
    PowerAuth { bmc: String },

    #[error("{backend} does not support {action}")]
    PowerUnsupported { backend: &'static str, action: String },

    #[error("power backend error for {bmc}: {detail}")]
    PowerBackend { bmc: String, detail: String },
}

impl From<PowerError> for Classified {
    fn from(e: PowerError) -> Self {
        match e {
            PowerError::PowerTimeout { .. } => Classified::transient(e.to_string()),
            PowerError::PowerAuth { .. } => Classified::Forbidden(e.to_string()),
            PowerError::PowerUnsupported { .. } => Classified::invalid(e.to_string()),
            PowerError::PowerBackend { .. } => Classified::transient(e.to_string()),
        }
    }
}
