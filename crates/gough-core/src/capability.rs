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

//! The three external collaborators named in §6. The core never talks to a
//! secrets manager, an object store, or an audit sink directly — it only
//! knows these traits, so a Vault/KMS/S3/whatever backend can be slotted in
//! by the embedder without the core crate knowing about it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Classified;

/// Capability for reading/writing opaque secret material (CA private keys,
/// BMC credentials, enrollment shared keys). Any backend — Vault, a cloud
/// KMS, a KV store — can implement this.
#[async_trait]
pub trait Secrets: Send + Sync {
    async fn get(&self, path: &str) -> Result<Vec<u8>, Classified>;
    async fn put(&self, path: &str, value: &[u8]) -> Result<(), Classified>;
    async fn delete(&self, path: &str) -> Result<(), Classified>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>, Classified>;
}

/// HTTP method a presigned `BlobStore` URL is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresignMethod {
    Get,
    Put,
}

/// Addresses an object uniquely across backends, per §6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub backend_id: String,
    pub bucket: String,
    pub key: String,
}

/// Capability for the object storage backends (S3/MinIO/GCS/Azure) that
/// hold boot images and LXD image tarballs. Workers never hold credentials
/// to this — only `control` presigns on a worker's behalf (§4.1, §5).
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, blob: &BlobRef, data: Vec<u8>) -> Result<(), Classified>;
    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>, Classified>;
    async fn head(&self, blob: &BlobRef) -> Result<bool, Classified>;
    async fn list(&self, backend_id: &str, bucket: &str, prefix: &str) -> Result<Vec<String>, Classified>;
    async fn delete(&self, blob: &BlobRef) -> Result<(), Classified>;
    async fn create_bucket(&self, backend_id: &str, bucket: &str) -> Result<(), Classified>;
    async fn presign(
        &self,
        blob: &BlobRef,
        ttl: Duration,
        method: PresignMethod,
    ) -> Result<String, Classified>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A single typed audit event, per §6. Storage of these is external; the
/// core only appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub severity: Severity,
    pub actor: String,
    pub resource_ref: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Capability for appending typed audit events; storage is external.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, event: AuditEvent) -> Result<(), Classified>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// A minimal in-memory sink, used by downstream crates' own tests.
    #[derive(Default)]
    pub struct RecordingAuditSink {
        pub events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditSink for RecordingAuditSink {
        async fn append(&self, event: AuditEvent) -> Result<(), Classified> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    #[tokio::test]
    async fn recording_sink_keeps_events_in_order() {
        let sink = RecordingAuditSink::default();
        for i in 0..3 {
            sink.append(AuditEvent {
                event_type: format!("event.{i}"),
                severity: Severity::Info,
                actor: "tester".into(),
                resource_ref: "machine:m1".into(),
                details: serde_json::json!({}),
                timestamp: Utc::now(),
            })
            .await
            .unwrap();
        }
        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, "event.0");
    }
}
