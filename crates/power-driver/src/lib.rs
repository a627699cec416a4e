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

//! C6: a uniform `{on, off, cycle, reset, status}` plus `set_next_boot`
//! interface over IPMI, Redfish and Wake-on-LAN, per spec §4.6. Backend
//! selection is data-driven by `Machine.power_type`; each backend owns its
//! own transport and normalizes its errors into [`error::PowerError`].

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod dispatch;
pub mod error;
pub mod ipmi;
pub mod lock;
pub mod redfish;
pub mod wol;

use async_trait::async_trait;

pub use dispatch::DispatchingPowerDriver;
pub use error::PowerError;
pub use lock::BmcLocks;

/// A single power action, per §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    On,
    Off,
    Cycle,
    Reset,
    Status,
}

impl PowerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Cycle => "cycle",
            Self::Reset => "reset",
            Self::Status => "status",
        }
    }
}

/// Observed power state, returned by the `status` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
    Unknown,
}

/// Boot device selected by `set_next_boot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootDevice {
    Pxe,
    Disk,
    Bios,
}

/// Whether a `set_next_boot` change survives the next reboot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    OneShot,
    Persistent,
}

/// BMC connection details for a single machine, per §3 `Machine.bmc_address`
/// / `power_type`. Credentials are never logged by any backend (§4.6).
/// `power_type` is what [`dispatch::DispatchingPowerDriver`] reads to pick
/// a backend; single-backend callers (tests, a fixed-topology deployment)
/// may ignore it.
#[derive(Debug, Clone)]
pub struct BmcCredentials {
    pub address: String,
    pub username: String,
    pub password: String,
    pub power_type: gough_core::model::PowerType,
}

/// Uniform power-control interface, per §4.6. Implementations own their
/// transport specifics and must normalize every failure into a
/// [`PowerError`] variant so callers never see backend-specific codes.
#[async_trait]
pub trait PowerDriver: Send + Sync {
    async fn power(&self, bmc: &BmcCredentials, action: PowerAction) -> Result<PowerState, PowerError>;

    async fn set_next_boot(
        &self,
        bmc: &BmcCredentials,
        device: BootDevice,
        persistence: Persistence,
    ) -> Result<(), PowerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_action_round_trips_through_str() {
        assert_eq!(PowerAction::Cycle.as_str(), "cycle");
        assert_eq!(PowerAction::Status.as_str(), "status");
    }
}
