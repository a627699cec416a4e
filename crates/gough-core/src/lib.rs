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

//! Shared core of the Gough bare-metal provisioning control plane.
//!
//! This crate holds the data model (§3 of the spec), the error taxonomy
//! (§7), and the `Secrets` / `BlobStore` / `AuditSink` capability traits
//! (§6) that every other crate in the workspace programs against. It does
//! no I/O of its own.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod backoff;
pub mod capability;
pub mod error;
pub mod model;

pub use capability::{AuditEvent, AuditSink, BlobRef, BlobStore, PresignMethod, Secrets, Severity};
pub use error::{Classified, ErrorBody, Result};
