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

//! The pure core of C2: the §4.2 machine status state machine and the
//! iPXE-script decision function. No I/O, no persistence — `control` drives
//! this module and owns every side effect.

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod script;
pub mod transition;

pub use script::{render_ipxe_script, ScriptContext};
pub use transition::{transition, Trigger, TransitionError};
