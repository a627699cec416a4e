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

//! §4.1 DHCP/ProxyDHCP loop. `full` mode answers on UDP/67 with a real
//! lease; `proxy` mode answers on UDP/4011 alongside an existing DHCP
//! server, contributing only PXE boot-server options; `disabled` mode
//! runs neither and TFTP/HTTP serve any client that already has an
//! address.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use gough_core::model::DhcpMode;
use log::{debug, info, warn};
use tokio::net::UdpSocket;

use crate::config::{FullDhcpConfig, WorkerConfig};
use crate::packet::{self, LeaseReply, MessageType, ProxyDhcpReply};

const DHCP_SERVER_PORT: u16 = 67;
const DHCP_CLIENT_PORT: u16 = 68;
const PROXY_DHCP_PORT: u16 = 4011;
const DEFAULT_LEASE_SECONDS: u32 = 3600;

/// Hands out leases from `range_start..=range_end` in round-robin order.
/// Good enough for the bounded, short-lived PXE-phase leases this worker
/// issues — a client re-requests well before its real OS-level DHCP
/// client takes over post-install.
struct LeaseAllocator {
    start: u32,
    count: u32,
    cursor: AtomicU32,
}

impl LeaseAllocator {
    fn new(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        let start_u32 = u32::from(start);
        let end_u32 = u32::from(end);
        Self {
            start: start_u32,
            count: end_u32.saturating_sub(start_u32) + 1,
            cursor: AtomicU32::new(0),
        }
    }

    fn next(&self) -> Ipv4Addr {
        let offset = self.cursor.fetch_add(1, Ordering::Relaxed) % self.count.max(1);
        Ipv4Addr::from(self.start + offset)
    }
}

fn boot_filename_for(arch: Option<packet::ClientArch>) -> &'static str {
    match arch {
        Some(packet::ClientArch::EfiX86_64) | Some(packet::ClientArch::Efi) => "ipxe.efi",
        _ => "undionly.kpxe",
    }
}

pub async fn run_full_mode(config: &WorkerConfig, full: &FullDhcpConfig, http_host: Ipv4Addr) -> std::io::Result<()> {
    let socket = bind_broadcast(DHCP_SERVER_PORT).await?;
    let allocator = LeaseAllocator::new(full.range_start, full.range_end);
    info!(target: "boot_worker::dhcp", "full DHCP mode listening on 0.0.0.0:{DHCP_SERVER_PORT}, interface {}", config.dhcp_interface);

    let mut buf = [0u8; 1500];
    loop {
        let (len, _from) = socket.recv_from(&mut buf).await?;
        let request = match packet::parse_request(&buf[..len]) {
            Ok(req) => req,
            Err(e) => {
                debug!(target: "boot_worker::dhcp", "dropping unparseable DHCP packet: {e}");
                continue;
            }
        };

        let reply_type = match request.message_type {
            MessageType::Discover => MessageType::Offer,
            MessageType::Request => MessageType::Ack,
            _ => continue,
        };

        let your_ip = request.requested_ip.unwrap_or_else(|| allocator.next());
        let reply = LeaseReply {
            message_type: reply_type,
            transaction_id: request.transaction_id,
            chaddr: request.chaddr,
            your_ip,
            server_ip: http_host,
            subnet_mask: full.subnet,
            gateway: full.gateway,
            lease_seconds: DEFAULT_LEASE_SECONDS,
            boot_filename: request.is_pxe_client.then(|| boot_filename_for(request.client_arch).to_string()),
            next_server: request.is_pxe_client.then_some(http_host),
        };

        let bytes = packet::build_lease_reply(&reply);
        if let Err(e) = send_broadcast_reply(&socket, &bytes).await {
            warn!(target: "boot_worker::dhcp", "failed to send DHCP reply for {}: {e}", request.mac_string());
        }
    }
}

pub async fn run_proxy_mode(config: &WorkerConfig, http_host: Ipv4Addr) -> std::io::Result<()> {
    let socket = bind_broadcast(PROXY_DHCP_PORT).await?;
    info!(target: "boot_worker::dhcp", "proxy DHCP mode listening on 0.0.0.0:{PROXY_DHCP_PORT}, interface {}", config.dhcp_interface);

    let mut buf = [0u8; 1500];
    loop {
        let (len, _from) = socket.recv_from(&mut buf).await?;
        let request = match packet::parse_request(&buf[..len]) {
            Ok(req) => req,
            Err(e) => {
                debug!(target: "boot_worker::dhcp", "dropping unparseable ProxyDHCP packet: {e}");
                continue;
            }
        };
        if !request.is_pxe_client {
            continue;
        }

        let reply = ProxyDhcpReply {
            transaction_id: request.transaction_id,
            chaddr: request.chaddr,
            server_ip: http_host,
            boot_filename: boot_filename_for(request.client_arch).to_string(),
        };
        let bytes = packet::build_proxy_reply(&reply);
        if let Err(e) = send_broadcast_reply(&socket, &bytes).await {
            warn!(target: "boot_worker::dhcp", "failed to send ProxyDHCP reply for {}: {e}", request.mac_string());
        }
    }
}

async fn bind_broadcast(port: u16) -> std::io::Result<Arc<UdpSocket>> {
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    socket.set_broadcast(true)?;
    Ok(Arc::new(socket))
}

async fn send_broadcast_reply(socket: &UdpSocket, bytes: &[u8]) -> std::io::Result<()> {
    let dest = SocketAddr::from(([255, 255, 255, 255], DHCP_CLIENT_PORT));
    socket.send_to(bytes, dest).await?;
    Ok(())
}

pub async fn run(config: &WorkerConfig, http_host: Ipv4Addr) -> std::io::Result<()> {
    match config.dhcp_mode {
        DhcpMode::Full => {
            let full = config
                .full_dhcp
                .as_ref()
                .expect("WorkerConfig::from_env guarantees full_dhcp is set when dhcp_mode is Full");
            run_full_mode(config, full, http_host).await
        }
        DhcpMode::Proxy => run_proxy_mode(config, http_host).await,
        DhcpMode::Disabled => {
            info!(target: "boot_worker::dhcp", "DHCP disabled; relying on an external DHCP server for PXE next-server/filename");
            std::future::pending::<()>().await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_allocator_wraps_around_the_range() {
        let allocator = LeaseAllocator::new(Ipv4Addr::new(10, 0, 0, 10), Ipv4Addr::new(10, 0, 0, 11));
        let first = allocator.next();
        let second = allocator.next();
        let third = allocator.next();
        assert_eq!(first, Ipv4Addr::new(10, 0, 0, 10));
        assert_eq!(second, Ipv4Addr::new(10, 0, 0, 11));
        assert_eq!(third, Ipv4Addr::new(10, 0, 0, 10));
    }

    #[test]
    fn boot_filename_selects_efi_binary_for_efi_arch() {
        assert_eq!(boot_filename_for(Some(packet::ClientArch::EfiX86_64)), "ipxe.efi");
        assert_eq!(boot_filename_for(Some(packet::ClientArch::BiosX86)), "undionly.kpxe");
        assert_eq!(boot_filename_for(None), "undionly.kpxe");
    }
}
