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

//! C4: the phase-by-phase `DeploymentJob` runner, per spec §4.4. Pure
//! phase-advance decisions live in [`decide`]; [`runner::Orchestrator`] is
//! the only part of this crate that touches a clock, a `PowerDriver`, or a
//! caller-supplied store.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod config;
pub mod decide;
pub mod phase;
pub mod rollback;
pub mod runner;

pub use config::OrchestratorConfig;
pub use decide::{Advance, EggDeployProgress, EggExpectation};
pub use phase::Phase;
pub use rollback::{RollbackActions, RollbackOutcome, RollbackRunner};
pub use runner::{BootEventSource, JobInputs, JobOutcome, Orchestrator, ProgressSink, VerificationProbe};
