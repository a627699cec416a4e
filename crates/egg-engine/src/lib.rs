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

//! C3: the typed egg/group catalog, DAG resolution, and deterministic
//! cloud-init composition, per spec §4.3. `resolve` lives in [`resolve`];
//! `render_cloud_init` and `validate` live in [`render`].

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod error;
pub mod render;
pub mod resolve;

pub use error::EggError;
pub use render::{render_cloud_init, render_cloud_init_with_limit, validate, DEFAULT_MAX_RENDERED_BYTES};
pub use resolve::{resolve, EggCatalog, InMemoryCatalog, MachineProfile, MAX_DEPENDENCY_DEPTH};
