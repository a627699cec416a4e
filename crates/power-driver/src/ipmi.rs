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

//! IPMI backend: shells out to `ipmitool -I lanplus`, a 30s timeout per
//! call, credentials passed as argv and never logged. Grounded on
//! `power_manager.py`'s `_ipmi_control` / `set_boot_device`.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::PowerError;
use crate::{BmcCredentials, BootDevice, Persistence, PowerAction, PowerDriver, PowerState};

const IPMI_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
pub struct IpmiDriver;

impl IpmiDriver {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, bmc: &BmcCredentials, args: &[&str]) -> Result<String, PowerError> {
        let mut cmd = Command::new("ipmitool");
        cmd.arg("-I")
            .arg("lanplus")
            .arg("-H")
            .arg(&bmc.address)
            .arg("-U")
            .arg(&bmc.username)
            .arg("-P")
            .arg(&bmc.password)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(target: "power_driver::ipmi", "executing ipmitool against {} (args redacted)", bmc.address);

        let child = cmd.spawn().map_err(|e| PowerError::PowerBackend {
            bmc: bmc.address.clone(),
            detail: format!("failed to spawn ipmitool: {e}"),
        })?;

        let output = timeout(IPMI_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| PowerError::PowerTimeout {
                bmc: bmc.address.clone(),
            })?
            .map_err(|e| PowerError::PowerBackend {
                bmc: bmc.address.clone(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!(target: "power_driver::ipmi", "ipmitool succeeded against {}", bmc.address);
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(target: "power_driver::ipmi", "ipmitool failed against {}: {}", bmc.address, stderr);
            if stderr.to_lowercase().contains("password")
                || stderr.to_lowercase().contains("authentication")
            {
                Err(PowerError::PowerAuth {
                    bmc: bmc.address.clone(),
                })
            } else {
                Err(PowerError::PowerBackend {
                    bmc: bmc.address.clone(),
                    detail: stderr,
                })
            }
        }
    }
}

#[async_trait]
impl PowerDriver for IpmiDriver {
    async fn power(&self, bmc: &BmcCredentials, action: PowerAction) -> Result<PowerState, PowerError> {
        let args: &[&str] = match action {
            PowerAction::On => &["power", "on"],
            PowerAction::Off => &["power", "off"],
            PowerAction::Cycle => &["power", "cycle"],
            PowerAction::Reset => &["power", "reset"],
            PowerAction::Status => &["power", "status"],
        };
        let output = self.run(bmc, args).await?;
        if action != PowerAction::Status {
            return Ok(PowerState::Unknown);
        }
        let lower = output.to_lowercase();
        if lower.contains("is on") {
            Ok(PowerState::On)
        } else if lower.contains("is off") {
            Ok(PowerState::Off)
        } else {
            Ok(PowerState::Unknown)
        }
    }

    async fn set_next_boot(
        &self,
        bmc: &BmcCredentials,
        device: BootDevice,
        persistence: Persistence,
    ) -> Result<(), PowerError> {
        let device_arg = match device {
            BootDevice::Pxe => "pxe",
            BootDevice::Disk => "disk",
            BootDevice::Bios => "bios",
        };
        let persistence_arg = match persistence {
            Persistence::OneShot => "options=efiboot",
            Persistence::Persistent => "persistent",
        };
        self.run(bmc, &["chassis", "bootdev", device_arg, persistence_arg])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_action_maps_to_lanplus_style_args() {
        // Documents the mapping used by `run`; exercised end-to-end only
        // where `ipmitool` is actually installed.
        assert_eq!(PowerAction::On.as_str(), "on");
    }
}
