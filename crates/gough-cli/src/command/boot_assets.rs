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

//! `gough boot-assets ...`, mirroring §6 `/boot-images`, `/boot-configs`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum BootAssets {
    /// `GET /boot-images`
    ListImages,
    /// `POST /boot-images` with the image's JSON read from `--file`.
    UpsertImage {
        #[structopt(long, parse(from_os_str))]
        file: PathBuf,
    },
    /// `GET /boot-configs/{name}`
    GetConfig { name: String },
    /// `POST /boot-configs` with the config's JSON read from `--file`.
    UpsertConfig {
        #[structopt(long, parse(from_os_str))]
        file: PathBuf,
    },
}

impl BootAssets {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            BootAssets::ListImages => client.get("/boot-images").await,
            BootAssets::UpsertImage { file } => client.post("/boot-images", &read_json(&file)?).await,
            BootAssets::GetConfig { name } => client.get(&format!("/boot-configs/{name}")).await,
            BootAssets::UpsertConfig { file } => client.post("/boot-configs", &read_json(&file)?).await,
        }
    }
}

fn read_json(path: &PathBuf) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}
