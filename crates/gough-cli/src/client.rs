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

//! A thin `reqwest` wrapper over the §6 HTTP surface: every subcommand
//! issues one call through here and gets back the parsed JSON body plus
//! whether the server classified it as an error, so `main` can set the
//! process exit code without every subcommand re-deriving it.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// The outcome of one HTTP call: a body (success or the `{error,
/// message}` shape of §6/§7) tagged with whether the caller should treat it
/// as a failure for exit-code purposes.
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    control_url: String,
    admin_api_key: String,
}

impl Client {
    pub fn new(control_url: String, admin_api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            control_url: control_url.trim_end_matches('/').to_string(),
            admin_api_key,
        })
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Response> {
        let url = format!("{}{}", self.control_url, path);
        let mut req = self
            .http
            .request(method, &url)
            .bearer_auth(&self.admin_api_key);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.with_context(|| format!("calling {url}"))?;
        let status = resp.status().as_u16();
        let body = resp
            .json::<Value>()
            .await
            .unwrap_or_else(|_| Value::String(String::new()));
        Ok(Response { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.send(reqwest::Method::GET, path, None).await
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let value = serde_json::to_value(body).context("encoding request body")?;
        self.send(reqwest::Method::POST, path, Some(value)).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<Response> {
        self.send(reqwest::Method::POST, path, Some(Value::Object(Default::default()))).await
    }

    pub async fn put<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let value = serde_json::to_value(body).context("encoding request body")?;
        self.send(reqwest::Method::PUT, path, Some(value)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.send(reqwest::Method::DELETE, path, None).await
    }
}
