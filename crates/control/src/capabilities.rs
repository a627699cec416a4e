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

//! Default stand-ins for the `Secrets` / `BlobStore` / `AuditSink`
//! capabilities of §6. A real deployment slots in a Vault client, an S3
//! client and a log-shipping sink here instead; these exist so the service
//! runs standalone and so its own tests don't need a Vault or a bucket.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use gough_core::{AuditEvent, AuditSink, BlobRef, BlobStore, Classified, PresignMethod, Secrets};

/// The number of recent audit events `LoggingAuditSink` keeps in memory for
/// inspection; older ones are only visible in the log stream.
const AUDIT_RING_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
pub struct InMemorySecrets {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl Secrets for InMemorySecrets {
    async fn get(&self, path: &str) -> Result<Vec<u8>, Classified> {
        self.values
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Classified::not_found(format!("secret {path} not found")))
    }

    async fn put(&self, path: &str, value: &[u8]) -> Result<(), Classified> {
        self.values.lock().unwrap().insert(path.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), Classified> {
        self.values.lock().unwrap().remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, Classified> {
        Ok(self
            .values
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<(String, String, String), Vec<u8>>>,
}

impl InMemoryBlobStore {
    fn key(blob: &BlobRef) -> (String, String, String) {
        (blob.backend_id.clone(), blob.bucket.clone(), blob.key.clone())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, blob: &BlobRef, data: Vec<u8>) -> Result<(), Classified> {
        self.objects.lock().unwrap().insert(Self::key(blob), data);
        Ok(())
    }

    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>, Classified> {
        self.objects
            .lock()
            .unwrap()
            .get(&Self::key(blob))
            .cloned()
            .ok_or_else(|| Classified::not_found(format!("blob {} not found", blob.key)))
    }

    async fn head(&self, blob: &BlobRef) -> Result<bool, Classified> {
        Ok(self.objects.lock().unwrap().contains_key(&Self::key(blob)))
    }

    async fn list(&self, backend_id: &str, bucket: &str, prefix: &str) -> Result<Vec<String>, Classified> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, bk, k)| b == backend_id && bk == bucket && k.starts_with(prefix))
            .map(|(_, _, k)| k.clone())
            .collect())
    }

    async fn delete(&self, blob: &BlobRef) -> Result<(), Classified> {
        self.objects.lock().unwrap().remove(&Self::key(blob));
        Ok(())
    }

    async fn create_bucket(&self, _backend_id: &str, _bucket: &str) -> Result<(), Classified> {
        Ok(())
    }

    async fn presign(&self, blob: &BlobRef, ttl: Duration, method: PresignMethod) -> Result<String, Classified> {
        Ok(format!(
            "https://blobs.invalid/{}/{}/{}?method={:?}&ttl={}",
            blob.backend_id,
            blob.bucket,
            blob.key,
            method,
            ttl.as_secs()
        ))
    }
}

#[derive(Debug, Default)]
pub struct LoggingAuditSink {
    recent: Mutex<VecDeque<AuditEvent>>,
}

#[async_trait]
impl AuditSink for LoggingAuditSink {
    async fn append(&self, event: AuditEvent) -> Result<(), Classified> {
        log::info!(
            target: "control::audit",
            "{} actor={} resource={} severity={:?}",
            event.event_type,
            event.actor,
            event.resource_ref,
            event.severity
        );
        let mut recent = self.recent.lock().unwrap();
        recent.push_back(event);
        while recent.len() > AUDIT_RING_CAPACITY {
            recent.pop_front();
        }
        Ok(())
    }
}
