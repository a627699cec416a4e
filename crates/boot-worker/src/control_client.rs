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

//! The worker's only outbound channel to Control: boot-script/cloud-init
//! lookups, boot-event reporting, and heartbeats, all bearer-authenticated
//! with the session token from [`crate::enrollment`] and retried with the
//! shared backoff policy. Every call degrades to the [`ScriptCache`] on
//! exhaustion where §7 allows it.

use std::sync::Arc;
use std::time::Duration;

use gough_core::backoff::{retry_with_backoff, ExponentialBackoff};
use gough_core::model::BootEvent;
use log::warn;
use serde::Deserialize;

use crate::cache::ScriptCache;
use crate::config::WorkerConfig;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
const CONTROL_CALL_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ControlClientError {
    #[error("control returned not found")]
    NotFound,
    #[error("control request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("control returned status {0}")]
    Status(u16),
}

#[derive(Debug, Deserialize)]
struct BootScriptResponse {
    script: String,
}

#[derive(Debug, Deserialize)]
struct CloudInitResponse {
    content: String,
}

#[derive(Debug)]
pub struct ControlClient {
    http: reqwest::Client,
    control_url: String,
    worker_api_key: String,
    worker_id: String,
    cache: Arc<ScriptCache>,
}

impl ControlClient {
    pub fn new(config: &WorkerConfig, cache: Arc<ScriptCache>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .expect("reqwest client builder with static config never fails");
        Self {
            http,
            control_url: config.control_url.clone(),
            worker_api_key: config.worker_api_key.clone(),
            worker_id: config.worker_id.clone(),
            cache,
        }
    }

    /// `GET /internal/boot-script?mac=...`, falling back to the cached
    /// script on repeated failure (§7). A cache hit on fallback is served
    /// regardless of staleness — §7 treats "something" as better than a
    /// hung boot when there is nothing fresher to offer.
    pub async fn boot_script(&self, mac: &str) -> Result<String, ControlClientError> {
        let url = format!("{}/internal/boot-script", self.control_url);
        let mac = mac.to_string();
        let result = retry_with_backoff(CONTROL_CALL_ATTEMPTS, ExponentialBackoff::standard(), || {
            let url = url.clone();
            let mac = mac.clone();
            async move { self.fetch_boot_script(&url, &mac).await }
        })
        .await;

        match result {
            Ok(script) => {
                self.cache.put(&mac, script.clone());
                Ok(script)
            }
            Err(e) => {
                if let Some(cached) = self.cache.get_any(&mac) {
                    warn!(target: "boot_worker::control_client", "control unreachable for boot-script({mac}), serving cached copy: {e}");
                    Ok(cached)
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn fetch_boot_script(&self, url: &str, mac: &str) -> Result<String, ControlClientError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.worker_api_key)
            .query(&[("mac", mac), ("worker_id", self.worker_id.as_str())])
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ControlClientError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(ControlClientError::Status(resp.status().as_u16()));
        }
        Ok(resp.json::<BootScriptResponse>().await?.script)
    }

    /// `GET /internal/cloud-init/<machine_id>/{meta-data,user-data}`.
    pub async fn cloud_init(&self, machine_id: &str, part: &str) -> Result<String, ControlClientError> {
        let url = format!("{}/internal/cloud-init/{}/{}", self.control_url, machine_id, part);
        let cache_key = format!("{machine_id}/{part}");
        let result = retry_with_backoff(CONTROL_CALL_ATTEMPTS, ExponentialBackoff::standard(), || {
            let url = url.clone();
            async move { self.fetch_cloud_init(&url).await }
        })
        .await;

        match result {
            Ok(content) => {
                self.cache.put(&cache_key, content.clone());
                Ok(content)
            }
            Err(e) => {
                if let Some(cached) = self.cache.get_any(&cache_key) {
                    warn!(target: "boot_worker::control_client", "control unreachable for cloud-init({cache_key}), serving cached copy: {e}");
                    Ok(cached)
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn fetch_cloud_init(&self, url: &str) -> Result<String, ControlClientError> {
        let resp = self.http.get(url).bearer_auth(&self.worker_api_key).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ControlClientError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(ControlClientError::Status(resp.status().as_u16()));
        }
        Ok(resp.json::<CloudInitResponse>().await?.content)
    }

    /// `POST /internal/boot-event`. Best-effort: a dropped event is logged,
    /// never blocks the boot path it's reporting on.
    pub async fn report_boot_event(&self, event: &BootEvent) {
        let url = format!("{}/internal/boot-event", self.control_url);
        let result = retry_with_backoff(CONTROL_CALL_ATTEMPTS, ExponentialBackoff::standard(), || async {
            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.worker_api_key)
                .json(event)
                .send()
                .await
                .map_err(ControlClientError::from)?;
            if resp.status().is_success() {
                Ok(())
            } else {
                Err(ControlClientError::Status(resp.status().as_u16()))
            }
        })
        .await;

        if let Err(e) = result {
            warn!(target: "boot_worker::control_client", "dropping boot event for {}: {e}", event.mac);
        }
    }

    /// `POST /workers/heartbeat`.
    pub async fn heartbeat(&self) -> Result<(), ControlClientError> {
        let url = format!("{}/workers/heartbeat", self.control_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.worker_api_key)
            .json(&serde_json::json!({ "worker_id": self.worker_id }))
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ControlClientError::Status(resp.status().as_u16()))
        }
    }
}
