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

//! Wake-on-LAN backend: a magic-packet UDP broadcast. Supports only `on`;
//! every other power action and `set_next_boot` fail with
//! `PowerUnsupported`, per §4.6. Grounded on `power_manager.py`'s
//! `_wol_control` / `_send_wol_manual`.

use async_trait::async_trait;
use log::info;
use tokio::net::UdpSocket;

use crate::error::PowerError;
use crate::{BmcCredentials, BootDevice, Persistence, PowerAction, PowerDriver, PowerState};
#[cfg(test)]
use gough_core::model::PowerType;

#[derive(Debug, Default)]
pub struct WolDriver;

impl WolDriver {
    pub fn new() -> Self {
        Self
    }

    /// `bmc.address` holds the target MAC address for WoL, not a BMC host.
    fn magic_packet(mac: &str) -> Result<Vec<u8>, PowerError> {
        let normalized = mac.replace([':', '-'], "");
        let bytes = hex_decode(&normalized).ok_or_else(|| PowerError::PowerBackend {
            bmc: mac.to_string(),
            detail: format!("not a MAC address: {mac}"),
        })?;
        if bytes.len() != 6 {
            return Err(PowerError::PowerBackend {
                bmc: mac.to_string(),
                detail: format!("MAC address must be 6 bytes, got {}", bytes.len()),
            });
        }
        let mut packet = vec![0xffu8; 6];
        for _ in 0..16 {
            packet.extend_from_slice(&bytes);
        }
        Ok(packet)
    }
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[async_trait]
impl PowerDriver for WolDriver {
    async fn power(&self, bmc: &BmcCredentials, action: PowerAction) -> Result<PowerState, PowerError> {
        if action != PowerAction::On {
            return Err(PowerError::PowerUnsupported {
                backend: "wol",
                action: action.as_str().to_string(),
            });
        }

        let packet = Self::magic_packet(&bmc.address)?;
        let socket = UdpSocket::bind("0.0.0.0:0").await.map_err(|e| PowerError::PowerBackend {
            bmc: bmc.address.clone(),
            detail: e.to_string(),
        })?;
        socket.set_broadcast(true).map_err(|e| PowerError::PowerBackend {
            bmc: bmc.address.clone(),
            detail: e.to_string(),
        })?;
        socket
            .send_to(&packet, "255.255.255.255:9")
            .await
            .map_err(|e| PowerError::PowerBackend {
                bmc: bmc.address.clone(),
                detail: e.to_string(),
            })?;

        info!(target: "power_driver::wol", "magic packet sent for {}", bmc.address);
        Ok(PowerState::Unknown)
    }

    async fn set_next_boot(
        &self,
        _bmc: &BmcCredentials,
        _device: BootDevice,
        _persistence: Persistence,
    ) -> Result<(), PowerError> {
        Err(PowerError::PowerUnsupported {
            backend: "wol",
            action: "set_next_boot".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_packet_has_six_broadcast_bytes_then_sixteen_mac_repeats() {
        let packet = WolDriver::magic_packet("aa:bb:cc:11:22:33").unwrap();
        assert_eq!(packet.len(), 6 + 16 * 6);
        assert_eq!(&packet[0..6], &[0xff; 6]);
        assert_eq!(&packet[6..12], &[0xaa, 0xbb, 0xcc, 0x11, 0x22, 0x33]);
    }

    #[test]
    fn rejects_malformed_mac() {
        assert!(WolDriver::magic_packet("not-a-mac").is_err());
    }

    #[tokio::test]
    async fn non_on_actions_are_unsupported() {
        let driver = WolDriver::new();
        let bmc = BmcCredentials {
            address: "aa:bb:cc:11:22:33".into(),
            username: String::new(),
            password: String::new(),
            power_type: PowerType::Wol,
        };
        let err = driver.power(&bmc, PowerAction::Off).await.unwrap_err();
        assert!(matches!(err, PowerError::PowerUnsupported { .. }));
    }
}
