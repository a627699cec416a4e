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

//! `gough`: the administrative CLI of §6. Subcommands mirror the HTTP
//! verbs one-for-one; `--json` prints the raw response body, otherwise a
//! pretty-printed rendering goes to stdout. Any 4xx/5xx response exits
//! non-zero, matching the contract the spec's CLI surface names.

mod client;
mod command;

use std::process::ExitCode;

use anyhow::Result;
use structopt::StructOpt;

use client::Client;
use command::Command;

#[derive(StructOpt, Debug)]
#[structopt(name = "gough", author, about = "Administrative CLI for the Gough control plane")]
struct Opt {
    /// Base URL of the `control` service, e.g. `http://localhost:8090`.
    #[structopt(long, env = "CONTROL_URL")]
    control_url: String,
    /// The admin shared key `control` was started with (`ADMIN_API_KEY`).
    #[structopt(long, env = "ADMIN_API_KEY", hide_env_values = true)]
    admin_api_key: String,
    /// Print the raw JSON response instead of a human-readable rendering.
    #[structopt(long)]
    json: bool,
    #[structopt(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let opt = Opt::from_args();
    match run(opt).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(opt: Opt) -> Result<ExitCode> {
    let client = Client::new(opt.control_url, opt.admin_api_key)?;
    let response = opt.command.execute(&client).await?;

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&response.body)?);
    } else if response.is_error() {
        eprintln!("{} {}", response.status, pretty(&response.body));
    } else {
        println!("{}", pretty(&response.body));
    }

    Ok(if response.is_error() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
