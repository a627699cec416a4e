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

//! BOOTP/DHCP wire format, per §4.1. Pure parse/build — no sockets here,
//! see [`crate::dhcp`] for the UDP loop that calls into this module.

use std::net::Ipv4Addr;

pub const DHCP_MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];
const BOOTP_FIXED_LEN: usize = 236;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Discover,
    Offer,
    Request,
    Ack,
    Nak,
    Release,
    Inform,
}

impl MessageType {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Discover),
            2 => Some(Self::Offer),
            3 => Some(Self::Request),
            5 => Some(Self::Ack),
            6 => Some(Self::Nak),
            7 => Some(Self::Release),
            8 => Some(Self::Inform),
            _ => None,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Discover => 1,
            Self::Offer => 2,
            Self::Request => 3,
            Self::Ack => 5,
            Self::Nak => 6,
            Self::Release => 7,
            Self::Inform => 8,
        }
    }
}

/// Client architecture from DHCP option 93, RFC 4578. Only the values the
/// corpus of real firmware actually sends are named; anything else maps to
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientArch {
    BiosX86,
    Efi,
    EfiX86_64,
    Other(u16),
}

impl ClientArch {
    fn from_u16(v: u16) -> Self {
        match v {
            0 => Self::BiosX86,
            7 | 9 => Self::EfiX86_64,
            6 => Self::Efi,
            other => Self::Other(other),
        }
    }
}

/// A parsed DHCP request, the fields `dhcp.rs`/`http.rs` need to build a
/// response and select/render an iPXE script.
#[derive(Debug, Clone)]
pub struct DhcpRequest {
    pub message_type: MessageType,
    pub transaction_id: u32,
    pub chaddr: [u8; 6],
    pub ciaddr: Ipv4Addr,
    pub requested_ip: Option<Ipv4Addr>,
    pub vendor_class: Option<String>,
    pub client_arch: Option<ClientArch>,
    pub is_pxe_client: bool,
    pub parameter_request_list: Vec<u8>,
}

impl DhcpRequest {
    pub fn mac_string(&self) -> String {
        self.chaddr
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("packet shorter than the fixed BOOTP header")]
    Truncated,
    #[error("missing DHCP magic cookie")]
    BadCookie,
    #[error("missing DHCP message type option")]
    MissingMessageType,
    #[error("unrecognized DHCP message type {0}")]
    UnknownMessageType(u8),
}

/// Parses a raw UDP/67 payload into a [`DhcpRequest`]. Options are walked
/// once; unrecognized option codes are skipped using their length byte.
pub fn parse_request(buf: &[u8]) -> Result<DhcpRequest, PacketError> {
    if buf.len() < BOOTP_FIXED_LEN + 4 {
        return Err(PacketError::Truncated);
    }
    if buf[236..240] != DHCP_MAGIC_COOKIE {
        return Err(PacketError::BadCookie);
    }

    let transaction_id = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let ciaddr = Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]);
    let mut chaddr = [0u8; 6];
    chaddr.copy_from_slice(&buf[28..34]);

    let mut message_type: Option<MessageType> = None;
    let mut requested_ip = None;
    let mut vendor_class = None;
    let mut client_arch = None;
    let mut is_pxe_client = false;
    let mut parameter_request_list = Vec::new();

    let mut i = 240;
    while i < buf.len() {
        let code = buf[i];
        if code == 0xff {
            break;
        }
        if code == 0x00 {
            i += 1;
            continue;
        }
        if i + 1 >= buf.len() {
            break;
        }
        let len = buf[i + 1] as usize;
        let start = i + 2;
        let end = start + len;
        if end > buf.len() {
            break;
        }
        let data = &buf[start..end];

        match code {
            53 if len == 1 => {
                message_type = MessageType::from_u8(data[0]);
            }
            50 if len == 4 => {
                requested_ip = Some(Ipv4Addr::new(data[0], data[1], data[2], data[3]));
            }
            60 => {
                let class = String::from_utf8_lossy(data).to_string();
                is_pxe_client = class.starts_with("PXEClient");
                vendor_class = Some(class);
            }
            93 if len >= 2 => {
                client_arch = Some(ClientArch::from_u16(u16::from_be_bytes([data[0], data[1]])));
            }
            55 => {
                parameter_request_list = data.to_vec();
            }
            _ => {}
        }

        i = end;
    }

    let message_type = message_type.ok_or(PacketError::MissingMessageType)?;

    Ok(DhcpRequest {
        message_type,
        transaction_id,
        chaddr,
        ciaddr,
        requested_ip,
        vendor_class,
        client_arch,
        is_pxe_client,
        parameter_request_list,
    })
}

/// What `dhcp.rs` needs to know to build an Offer/Ack in full mode. Proxy
/// mode only ever fills [`ProxyDhcpReply`] (options, no lease).
#[derive(Debug, Clone)]
pub struct LeaseReply {
    pub message_type: MessageType,
    pub transaction_id: u32,
    pub chaddr: [u8; 6],
    pub your_ip: Ipv4Addr,
    pub server_ip: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub lease_seconds: u32,
    pub boot_filename: Option<String>,
    pub next_server: Option<Ipv4Addr>,
}

/// Builds the fixed header plus minimal option set for a full-mode lease
/// offer or ack, including the PXE-relevant `next-server`/`filename`
/// fields (siaddr + option 67) when present.
pub fn build_lease_reply(reply: &LeaseReply) -> Vec<u8> {
    let mut buf = vec![0u8; BOOTP_FIXED_LEN];
    buf[0] = 2; // BOOTREPLY
    buf[1] = 1; // htype ethernet
    buf[2] = 6; // hlen
    buf[4..8].copy_from_slice(&reply.transaction_id.to_be_bytes());
    buf[16..20].copy_from_slice(&reply.your_ip.octets());
    if let Some(next_server) = reply.next_server {
        buf[20..24].copy_from_slice(&next_server.octets());
    }
    buf[28..34].copy_from_slice(&reply.chaddr);

    buf.extend_from_slice(&DHCP_MAGIC_COOKIE);
    push_option(&mut buf, 53, &[reply.message_type.to_u8()]);
    push_option(&mut buf, 54, &reply.server_ip.octets());
    push_option(&mut buf, 1, &reply.subnet_mask.octets());
    push_option(&mut buf, 3, &reply.gateway.octets());
    push_option(&mut buf, 51, &reply.lease_seconds.to_be_bytes());
    if let Some(filename) = &reply.boot_filename {
        push_option(&mut buf, 67, filename.as_bytes());
    }
    buf.push(0xff);
    buf
}

/// Proxy-mode (RFC 4578 ProxyDHCP, UDP/4011) reply: carries only the PXE
/// boot-server/filename options, no address lease fields.
#[derive(Debug, Clone)]
pub struct ProxyDhcpReply {
    pub transaction_id: u32,
    pub chaddr: [u8; 6],
    pub server_ip: Ipv4Addr,
    pub boot_filename: String,
}

pub fn build_proxy_reply(reply: &ProxyDhcpReply) -> Vec<u8> {
    let mut buf = vec![0u8; BOOTP_FIXED_LEN];
    buf[0] = 2;
    buf[1] = 1;
    buf[2] = 6;
    buf[4..8].copy_from_slice(&reply.transaction_id.to_be_bytes());
    buf[20..24].copy_from_slice(&reply.server_ip.octets());
    buf[28..34].copy_from_slice(&reply.chaddr);

    buf.extend_from_slice(&DHCP_MAGIC_COOKIE);
    push_option(&mut buf, 53, &[MessageType::Ack.to_u8()]);
    push_option(&mut buf, 54, &reply.server_ip.octets());
    push_option(&mut buf, 60, b"PXEClient");
    push_option(&mut buf, 67, reply.boot_filename.as_bytes());
    buf.push(0xff);
    buf
}

fn push_option(buf: &mut Vec<u8>, code: u8, data: &[u8]) {
    buf.push(code);
    buf.push(data.len() as u8);
    buf.extend_from_slice(data);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_discover(arch: Option<u16>, vendor_class: Option<&str>) -> Vec<u8> {
        let mut buf = vec![0u8; BOOTP_FIXED_LEN];
        buf[0] = 1; // BOOTREQUEST
        buf[4..8].copy_from_slice(&0xdead_beefu32.to_be_bytes());
        buf[28..34].copy_from_slice(&[0xaa, 0xbb, 0xcc, 0x11, 0x22, 0x33]);
        buf.extend_from_slice(&DHCP_MAGIC_COOKIE);
        push_option(&mut buf, 53, &[MessageType::Discover.to_u8()]);
        if let Some(class) = vendor_class {
            push_option(&mut buf, 60, class.as_bytes());
        }
        if let Some(arch) = arch {
            push_option(&mut buf, 93, &arch.to_be_bytes());
        }
        buf.push(0xff);
        buf
    }

    #[test]
    fn parses_pxe_discover_with_arch_option() {
        let raw = sample_discover(Some(7), Some("PXEClient:Arch:00007"));
        let req = parse_request(&raw).unwrap();
        assert_eq!(req.message_type, MessageType::Discover);
        assert_eq!(req.transaction_id, 0xdead_beef);
        assert_eq!(req.mac_string(), "aabbcc112233");
        assert!(req.is_pxe_client);
        assert_eq!(req.client_arch, Some(ClientArch::EfiX86_64));
    }

    #[test]
    fn non_pxe_client_has_no_arch_and_is_not_pxe() {
        let raw = sample_discover(None, Some("MSFT 5.0"));
        let req = parse_request(&raw).unwrap();
        assert!(!req.is_pxe_client);
        assert!(req.client_arch.is_none());
    }

    #[test]
    fn rejects_truncated_packet() {
        assert!(matches!(parse_request(&[0u8; 10]), Err(PacketError::Truncated)));
    }

    #[test]
    fn rejects_bad_cookie() {
        let mut buf = vec![0u8; BOOTP_FIXED_LEN + 4];
        buf[236..240].copy_from_slice(&[1, 2, 3, 4]);
        assert!(matches!(parse_request(&buf), Err(PacketError::BadCookie)));
    }

    #[test]
    fn builds_lease_reply_with_filename_and_next_server() {
        let reply = LeaseReply {
            message_type: MessageType::Ack,
            transaction_id: 42,
            chaddr: [0, 1, 2, 3, 4, 5],
            your_ip: Ipv4Addr::new(10, 0, 0, 50),
            server_ip: Ipv4Addr::new(10, 0, 0, 1),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(10, 0, 0, 1),
            lease_seconds: 3600,
            boot_filename: Some("ipxe.efi".to_string()),
            next_server: Some(Ipv4Addr::new(10, 0, 0, 1)),
        };
        let bytes = build_lease_reply(&reply);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[16..20], &[10, 0, 0, 50]);
        assert_eq!(&bytes[20..24], &[10, 0, 0, 1]);
        assert!(bytes.ends_with(&[0xff]));
    }

    #[test]
    fn builds_proxy_reply_with_pxeclient_vendor_class() {
        let reply = ProxyDhcpReply {
            transaction_id: 7,
            chaddr: [0xaa; 6],
            server_ip: Ipv4Addr::new(10, 0, 0, 1),
            boot_filename: "ipxe.efi".to_string(),
        };
        let bytes = build_proxy_reply(&reply);
        let req_roundtrip_scan = bytes.windows(9).any(|w| w == b"PXEClient");
        assert!(req_roundtrip_scan);
    }
}
