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

//! Data-driven backend selection, per §9's "Plugin-like power backends"
//! design note: `BmcCredentials::power_type` picks which of IPMI/Redfish/WoL
//! handles a call, with `manual` normalized to `PowerUnsupported` rather
//! than silently no-opping. This is the single [`PowerDriver`] that
//! `deployment-orchestrator::Orchestrator` holds for its whole lifetime;
//! the backend choice happens per call, not per `Orchestrator`.

use async_trait::async_trait;
use gough_core::model::PowerType;

use crate::error::PowerError;
use crate::ipmi::IpmiDriver;
use crate::redfish::RedfishDriver;
use crate::wol::WolDriver;
use crate::{BmcCredentials, BootDevice, Persistence, PowerAction, PowerDriver, PowerState};

/// Routes each call to the backend named by `bmc.power_type`, normalizing
/// all three backends' errors through the shared [`PowerError`] taxonomy so
/// `deployment-orchestrator` never branches on backend identity.
#[derive(Debug, Default)]
pub struct DispatchingPowerDriver {
    ipmi: IpmiDriver,
    redfish: RedfishDriver,
    wol: WolDriver,
}

impl DispatchingPowerDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn backend(&self, power_type: PowerType) -> Option<&dyn PowerDriver> {
        match power_type {
            PowerType::Ipmi => Some(&self.ipmi),
            PowerType::Redfish => Some(&self.redfish),
            PowerType::Wol => Some(&self.wol),
            PowerType::Manual => None,
        }
    }
}

#[async_trait]
impl PowerDriver for DispatchingPowerDriver {
    async fn power(&self, bmc: &BmcCredentials, action: PowerAction) -> Result<PowerState, PowerError> {
        let backend = self.backend(bmc.power_type).ok_or(PowerError::PowerUnsupported {
            backend: "manual",
            action: action.as_str().to_string(),
        })?;
        backend.power(bmc, action).await
    }

    async fn set_next_boot(
        &self,
        bmc: &BmcCredentials,
        device: BootDevice,
        persistence: Persistence,
    ) -> Result<(), PowerError> {
        let backend = self.backend(bmc.power_type).ok_or(PowerError::PowerUnsupported {
            backend: "manual",
            action: "set_next_boot".into(),
        })?;
        backend.set_next_boot(bmc, device, persistence).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bmc(power_type: PowerType) -> BmcCredentials {
        BmcCredentials {
            address: "10.0.0.5".into(),
            username: "admin".into(),
            password: "admin".into(),
            power_type,
        }
    }

    #[tokio::test]
    async fn manual_power_type_is_unsupported() {
        let driver = DispatchingPowerDriver::new();
        let err = driver.power(&bmc(PowerType::Manual), PowerAction::On).await.unwrap_err();
        assert!(matches!(err, PowerError::PowerUnsupported { .. }));
    }

    #[tokio::test]
    async fn wol_power_type_routes_to_wol_backend_and_honors_on_only() {
        let driver = DispatchingPowerDriver::new();
        let mut target = bmc(PowerType::Wol);
        target.address = "aa:bb:cc:11:22:33".into();
        let err = driver.power(&target, PowerAction::Off).await.unwrap_err();
        assert!(matches!(err, PowerError::PowerUnsupported { .. }));
    }

    #[tokio::test]
    async fn wol_power_type_accepts_on_and_sends_magic_packet() {
        let driver = DispatchingPowerDriver::new();
        let mut target = bmc(PowerType::Wol);
        target.address = "aa:bb:cc:11:22:33".into();
        let state = driver.power(&target, PowerAction::On).await.unwrap();
        assert_eq!(state, PowerState::Unknown);
    }
}
