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

//! Subcommands mirroring the §6 HTTP verbs one-for-one. Each leaf command
//! takes the shared `Client`, issues exactly one HTTP call, and returns the
//! `Response` for `main` to print and turn into an exit code.

pub mod agents;
pub mod boot_assets;
pub mod deployments;
pub mod eggs;
pub mod machines;
pub mod ssh_ca;
pub mod teams;
pub mod workers;

use anyhow::Result;
use structopt::StructOpt;

use crate::client::{Client, Response};

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Machine inventory and the commission/release/hard-reset/reimage
    /// commands (§4.2, §6 `/machines/*`).
    Machines(machines::Machines),
    /// Deployment jobs: create, inspect, cancel, retry (§4.4, §6
    /// `/deployments/*`).
    Deployments(deployments::Deployments),
    /// The egg/group catalog and `/eggs/render` (§4.3, §6 `/eggs/*`,
    /// `/egg-groups/*`).
    Eggs(eggs::Eggs),
    /// Registered boot-workers (§3 "Worker", §6 `/workers`).
    Workers(workers::Workers),
    /// Deployed-machine agents and enrollment-key issuance (§4.5, §6
    /// `/agents/*`).
    Agents(agents::Agents),
    /// SSH certificate issuance (§4.5, §6 `/ssh-ca/sign`).
    SshCa(ssh_ca::SshCa),
    /// Boot image / boot config catalog (§3, §6 `/boot-images`,
    /// `/boot-configs`).
    BootAssets(boot_assets::BootAssets),
    /// Teams and resource assignments (§3's capability model, §6
    /// `/teams/*`).
    Teams(teams::Teams),
}

impl Command {
    pub async fn execute(self, client: &Client) -> Result<Response> {
        match self {
            Command::Machines(cmd) => cmd.execute(client).await,
            Command::Deployments(cmd) => cmd.execute(client).await,
            Command::Eggs(cmd) => cmd.execute(client).await,
            Command::Workers(cmd) => cmd.execute(client).await,
            Command::Agents(cmd) => cmd.execute(client).await,
            Command::SshCa(cmd) => cmd.execute(client).await,
            Command::BootAssets(cmd) => cmd.execute(client).await,
            Command::Teams(cmd) => cmd.execute(client).await,
        }
    }
}
