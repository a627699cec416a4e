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

//! Redfish backend: HTTPS POST to
//! `.../Systems/1/Actions/ComputerSystem.Reset`, status via GET
//! `.../Systems/1`. Grounded on `power_manager.py`'s `_redfish_control` /
//! `_redfish_get_status`.

use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::error::PowerError;
use crate::{BmcCredentials, BootDevice, Persistence, PowerAction, PowerDriver, PowerState};

const REDFISH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct RedfishDriver {
    client: Client,
}

impl Default for RedfishDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RedfishDriver {
    pub fn new() -> Self {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REDFISH_TIMEOUT)
            .build()
            .expect("reqwest client with a fixed timeout always builds");
        Self { client }
    }

    fn systems_url(bmc: &BmcCredentials) -> String {
        format!("https://{}/redfish/v1/Systems/1", bmc.address)
    }

    fn classify_status(bmc: &BmcCredentials, status: StatusCode, body: &str) -> PowerError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            PowerError::PowerAuth {
                bmc: bmc.address.clone(),
            }
        } else {
            PowerError::PowerBackend {
                bmc: bmc.address.clone(),
                detail: format!("redfish returned {status}: {body}"),
            }
        }
    }
}

#[async_trait]
impl PowerDriver for RedfishDriver {
    async fn power(&self, bmc: &BmcCredentials, action: PowerAction) -> Result<PowerState, PowerError> {
        if action == PowerAction::Status {
            let url = Self::systems_url(bmc);
            let response = self
                .client
                .get(&url)
                .basic_auth(&bmc.username, Some(&bmc.password))
                .send()
                .await
                .map_err(|e| to_power_error(bmc, e))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Self::classify_status(bmc, status, &body));
            }
            let body: serde_json::Value = response.json().await.map_err(|e| PowerError::PowerBackend {
                bmc: bmc.address.clone(),
                detail: e.to_string(),
            })?;
            let state = body
                .get("PowerState")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown")
                .to_lowercase();
            return Ok(match state.as_str() {
                "on" => PowerState::On,
                "off" => PowerState::Off,
                _ => PowerState::Unknown,
            });
        }

        let reset_type = match action {
            PowerAction::On => "On",
            PowerAction::Off => "ForceOff",
            PowerAction::Cycle | PowerAction::Reset => "ForceRestart",
            PowerAction::Status => unreachable!("handled above"),
        };
        let url = format!("{}/Actions/ComputerSystem.Reset", Self::systems_url(bmc));
        let response = self
            .client
            .post(&url)
            .basic_auth(&bmc.username, Some(&bmc.password))
            .json(&json!({ "ResetType": reset_type }))
            .send()
            .await
            .map_err(|e| to_power_error(bmc, e))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NO_CONTENT
        ) {
            info!(target: "power_driver::redfish", "redfish {action:?} succeeded against {}", bmc.address);
            Ok(PowerState::Unknown)
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(target: "power_driver::redfish", "redfish {action:?} failed against {}: {}", bmc.address, body);
            Err(Self::classify_status(bmc, status, &body))
        }
    }

    async fn set_next_boot(
        &self,
        bmc: &BmcCredentials,
        _device: BootDevice,
        _persistence: Persistence,
    ) -> Result<(), PowerError> {
        Err(PowerError::PowerUnsupported {
            backend: "redfish",
            action: "set_next_boot (boot-source override is not wired up for this workspace)".into(),
        })
    }
}

fn to_power_error(bmc: &BmcCredentials, e: reqwest::Error) -> PowerError {
    if e.is_timeout() {
        PowerError::PowerTimeout {
            bmc: bmc.address.clone(),
        }
    } else {
        PowerError::PowerBackend {
            bmc: bmc.address.clone(),
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn systems_url_is_https() {
        let bmc = BmcCredentials {
            address: "10.0.0.5".into(),
            username: "admin".into(),
            password: "admin".into(),
            power_type: gough_core::model::PowerType::Redfish,
        };
        assert_eq!(RedfishDriver::systems_url(&bmc), "https://10.0.0.5/redfish/v1/Systems/1");
    }
}
