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

//! A minimal read-only TFTP server (RFC 1350) for the network-boot
//! loader chain (`undionly.kpxe`, `ipxe.efi`) per §4.1 — everything past
//! the loader (scripts, cloud-init, images) is served over HTTP instead,
//! so this only ever needs RRQ/DATA/ACK/ERROR.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use tokio::net::UdpSocket;

const OPCODE_RRQ: u16 = 1;
const OPCODE_DATA: u16 = 3;
const OPCODE_ACK: u16 = 4;
const OPCODE_ERROR: u16 = 5;
const BLOCK_SIZE: usize = 512;
const ERR_FILE_NOT_FOUND: u16 = 1;
const ERR_ACCESS_VIOLATION: u16 = 2;

#[derive(Debug, thiserror::Error)]
enum TftpError {
    #[error("malformed TFTP packet")]
    Malformed,
    #[error("path escapes tftp root")]
    PathEscape,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn parse_rrq(buf: &[u8]) -> Result<String, TftpError> {
    if buf.len() < 4 || u16::from_be_bytes([buf[0], buf[1]]) != OPCODE_RRQ {
        return Err(TftpError::Malformed);
    }
    let rest = &buf[2..];
    let mut parts = rest.splitn(3, |&b| b == 0);
    let filename = parts.next().ok_or(TftpError::Malformed)?;
    String::from_utf8(filename.to_vec()).map_err(|_| TftpError::Malformed)
}

fn safe_join(root: &Path, filename: &str) -> Result<PathBuf, TftpError> {
    let relative = PathBuf::from(filename.replace('\\', "/"));
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(TftpError::PathEscape);
    }
    Ok(root.join(relative))
}

fn build_error(code: u16, message: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + message.len() + 1);
    buf.extend_from_slice(&OPCODE_ERROR.to_be_bytes());
    buf.extend_from_slice(&code.to_be_bytes());
    buf.extend_from_slice(message.as_bytes());
    buf.push(0);
    buf
}

fn build_data(block: u16, chunk: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + chunk.len());
    buf.extend_from_slice(&OPCODE_DATA.to_be_bytes());
    buf.extend_from_slice(&block.to_be_bytes());
    buf.extend_from_slice(chunk);
    buf
}

fn parse_ack(buf: &[u8]) -> Option<u16> {
    if buf.len() == 4 && u16::from_be_bytes([buf[0], buf[1]]) == OPCODE_ACK {
        Some(u16::from_be_bytes([buf[2], buf[3]]))
    } else {
        None
    }
}

/// Serves a single RRQ to completion over its own ephemeral socket, as the
/// TFTP protocol requires (the initial request arrives on :69, every
/// subsequent DATA/ACK uses a new per-transfer port).
async fn serve_transfer(peer: SocketAddr, data: Vec<u8>) -> std::io::Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(peer).await?;

    let mut block: u16 = 1;
    let mut offset = 0usize;
    loop {
        let end = (offset + BLOCK_SIZE).min(data.len());
        let chunk = &data[offset..end];
        let is_last = chunk.len() < BLOCK_SIZE;
        socket.send(&build_data(block, chunk)).await?;

        let mut ack_buf = [0u8; 4];
        match tokio::time::timeout(std::time::Duration::from_secs(5), socket.recv(&mut ack_buf)).await {
            Ok(Ok(_)) => match parse_ack(&ack_buf) {
                Some(acked) if acked == block => {
                    offset = end;
                    block = block.wrapping_add(1);
                    if is_last {
                        return Ok(());
                    }
                }
                _ => continue,
            },
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(target: "boot_worker::tftp", "transfer to {peer} timed out waiting for ack of block {block}");
                return Ok(());
            }
        }
    }
}

pub async fn run(tftp_root: &str, port: u16) -> std::io::Result<()> {
    let root = PathBuf::from(tftp_root);
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    log::info!(target: "boot_worker::tftp", "TFTP loader server listening on 0.0.0.0:{port}, root {tftp_root}");

    let mut buf = [0u8; 1500];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let filename = match parse_rrq(&buf[..len]) {
            Ok(name) => name,
            Err(e) => {
                debug!(target: "boot_worker::tftp", "ignoring malformed request from {peer}: {e}");
                continue;
            }
        };

        let path = match safe_join(&root, &filename) {
            Ok(path) => path,
            Err(_) => {
                let error_socket = UdpSocket::bind("0.0.0.0:0").await?;
                error_socket.connect(peer).await?;
                error_socket
                    .send(&build_error(ERR_ACCESS_VIOLATION, "path escapes tftp root"))
                    .await?;
                continue;
            }
        };

        match tokio::fs::read(&path).await {
            Ok(data) => {
                tokio::spawn(async move {
                    if let Err(e) = serve_transfer(peer, data).await {
                        warn!(target: "boot_worker::tftp", "transfer to {peer} failed: {e}");
                    }
                });
            }
            Err(_) => {
                let error_socket = UdpSocket::bind("0.0.0.0:0").await?;
                error_socket.connect(peer).await?;
                error_socket
                    .send(&build_error(ERR_FILE_NOT_FOUND, &format!("{filename} not found")))
                    .await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rrq_filename() {
        let mut buf = vec![0, 1];
        buf.extend_from_slice(b"undionly.kpxe");
        buf.push(0);
        buf.extend_from_slice(b"octet");
        buf.push(0);
        assert_eq!(parse_rrq(&buf).unwrap(), "undionly.kpxe");
    }

    #[test]
    fn rejects_path_traversal() {
        let root = PathBuf::from("/var/lib/gough/tftp");
        assert!(matches!(safe_join(&root, "../../etc/passwd"), Err(TftpError::PathEscape)));
    }

    #[test]
    fn joins_plain_filename_under_root() {
        let root = PathBuf::from("/var/lib/gough/tftp");
        let joined = safe_join(&root, "ipxe.efi").unwrap();
        assert_eq!(joined, PathBuf::from("/var/lib/gough/tftp/ipxe.efi"));
    }

    #[test]
    fn parses_ack_block_number() {
        let buf = [0, 4, 0, 7];
        assert_eq!(parse_ack(&buf), Some(7));
    }

    #[test]
    fn build_data_places_opcode_and_block_in_header() {
        let data = build_data(3, b"hello");
        assert_eq!(&data[0..2], &OPCODE_DATA.to_be_bytes());
        assert_eq!(&data[2..4], &3u16.to_be_bytes());
        assert_eq!(&data[4..], b"hello");
    }
}
