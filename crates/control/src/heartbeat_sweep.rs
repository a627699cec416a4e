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

//! The periodic sweep that turns a *missing* heartbeat into a state change.
//! `record_worker_heartbeat`/`record_agent_heartbeat` only reset a peer's
//! counters when it calls in; nothing ever notices silence on its own
//! unless something polls the clock, so `bin/main.rs` spawns [`run`] as a
//! background task alongside the `HttpServer`.

use std::time::Duration as StdDuration;

use actix_web::web;
use agent_protocol::heartbeat::DEFAULT_MISSED_THRESHOLD;
use chrono::{Duration, Utc};
use log::warn;

use crate::state::AppState;

/// Interval a worker/agent is expected to heartbeat at (§3, §4.5). The
/// sweep itself polls more often than this so a missed beat is caught
/// within a fraction of the interval rather than a whole one.
pub const HEARTBEAT_INTERVAL: Duration = Duration::seconds(30);

const SWEEP_PERIOD: StdDuration = StdDuration::from_secs(10);

/// Runs forever, recomputing missed-heartbeat counts for every worker and
/// agent every [`SWEEP_PERIOD`]. Intended to be `tokio::spawn`ed once at
/// startup; it never returns.
pub async fn run(state: web::Data<AppState>) {
    let mut ticker = tokio::time::interval(SWEEP_PERIOD);
    loop {
        ticker.tick().await;
        let now = Utc::now();

        let suspect_workers = state
            .store
            .sweep_worker_heartbeats(HEARTBEAT_INTERVAL, DEFAULT_MISSED_THRESHOLD, now);
        for worker in suspect_workers {
            warn!(
                target: "control::heartbeat_sweep",
                "worker {} marked suspect after {} missed heartbeats",
                worker.worker_id, worker.consecutive_missed_heartbeats
            );
        }

        let offline_agents = state
            .store
            .sweep_agent_heartbeats(HEARTBEAT_INTERVAL, DEFAULT_MISSED_THRESHOLD, now);
        for agent in offline_agents {
            warn!(
                target: "control::heartbeat_sweep",
                "agent {} marked offline after {} missed heartbeats",
                agent.agent_id, agent.consecutive_missed_heartbeats
            );
        }
    }
}
