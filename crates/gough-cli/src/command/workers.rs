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

//! `gough workers ...`, mirroring §6 `GET /workers`. Enrollment and
//! heartbeat are the worker binary's own job, not an admin's; this only
//! covers the read-only visibility an operator needs.

use anyhow::Result;
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum Workers {
    /// `GET /workers`
    List,
}

impl Workers {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            Workers::List => client.get("/workers").await,
        }
    }
}
