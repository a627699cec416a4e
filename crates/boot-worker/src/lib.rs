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

//! C1: the per-site BootWorker daemon. Runs a DHCP/ProxyDHCP loop, a
//! read-only TFTP loader server, and an HTTP surface for iPXE
//! scripts/cloud-init/images/boot-events, per spec §4.1. Degrades to a
//! cached last-known-good response when Control is unreachable (§7).

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod cache;
pub mod config;
pub mod control_client;
pub mod dhcp;
pub mod http;
pub mod packet;
pub mod tftp;

pub use cache::ScriptCache;
pub use config::WorkerConfig;
pub use control_client::{ControlClient, ControlClientError};
