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

//! `gough ssh-ca ...`, mirroring §6 `POST /ssh-ca/sign` (§4.5).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum SshCa {
    /// `POST /ssh-ca/sign`
    Sign {
        #[structopt(long)]
        user_email: String,
        /// Path to the requester's public key file (OpenSSH format).
        #[structopt(long, parse(from_os_str))]
        public_key_file: PathBuf,
        /// Comma-separated login principals.
        #[structopt(long)]
        principals: String,
        #[structopt(long)]
        validity_seconds: u64,
        #[structopt(long)]
        resource_type: String,
        #[structopt(long)]
        resource_id: String,
    },
}

impl SshCa {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            SshCa::Sign {
                user_email,
                public_key_file,
                principals,
                validity_seconds,
                resource_type,
                resource_id,
            } => {
                let user_public_key = fs::read_to_string(&public_key_file)
                    .with_context(|| format!("reading {}", public_key_file.display()))?
                    .trim()
                    .to_string();
                let principals: Vec<String> = principals.split(',').map(|s| s.trim().to_string()).collect();
                client
                    .post(
                        "/ssh-ca/sign",
                        &serde_json::json!({
                            "user_email": user_email,
                            "user_public_key": user_public_key,
                            "principals": principals,
                            "validity_seconds": validity_seconds,
                            "resource_type": resource_type,
                            "resource_id": resource_id,
                        }),
                    )
                    .await
            }
        }
    }
}
