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

/// Failure modes of `resolve`, `render_cloud_init` and `validate`, per §4.3.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EggError {
    #[error("unknown egg: {0}")]
    UnknownEgg(String),

    #[error("unknown egg group: {0}")]
    UnknownGroup(String),

    #[error("cycle detected in egg dependency graph, starting near {0}")]
    ConfigError(String),

    #[error("egg {egg} requires architecture {required:?} but machine is {actual:?}")]
    ArchMismatch {
        egg: String,
        required: String,
        actual: String,
    },

    #[error("egg {egg} needs {needed} but machine has {available} ({resource})")]
    InsufficientResources {
        egg: String,
        resource: &'static str,
        needed: u64,
        available: u64,
    },

    #[error("cloud-init content for egg {0} is not a YAML mapping")]
    InvalidCloudInit(String),

    #[error("rendered cloud-init is {actual} bytes, exceeding the {limit}-byte limit")]
    TooLarge { actual: usize, limit: usize },

    #[error("dependency chain depth {depth} exceeds the {limit} limit")]
    DepthLimit { depth: usize, limit: usize },

    #[error("malformed YAML: {0}")]
    Malformed(String),
}

impl From<EggError> for Classified {
    fn from(e: EggError) -> Self {
        Classified::invalid(e.to_string())
    }
}
