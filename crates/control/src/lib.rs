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

//! C2: `control`, the central machine inventory, deployment state machine,
//! and enrollment/heartbeat service. Owns the single in-memory [`store::Store`]
//! and exposes every HTTP route named in §6; `bin/main.rs` only wires it to
//! an `actix_web::HttpServer` and a periodic heartbeat sweep.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod auth;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod heartbeat_sweep;
pub mod routes;
pub mod state;
pub mod store;
pub mod teams;

pub use config::ControlConfig;
pub use state::AppState;
