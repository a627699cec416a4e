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

//! Everything a request handler needs, built once at startup per the §9
//! design note on global configuration, and shared behind `web::Data`.

use std::collections::HashMap;
use std::sync::Arc;

use agent_protocol::ssh_ca::CaKeypair;
use deployment_orchestrator::Orchestrator;
use gough_core::{AuditSink, BlobStore, Secrets};
use power_driver::{BmcLocks, DispatchingPowerDriver};
use tokio::sync::Mutex;

use crate::capabilities::{InMemoryBlobStore, InMemorySecrets, LoggingAuditSink};
use crate::config::ControlConfig;
use crate::store::Store;
use crate::teams::TeamRegistry;

/// A per-job cancellation flag, polled by the orchestrator between phase
/// steps (§5 "Cancellation & timeouts").
pub type CancelFlags = Mutex<HashMap<String, Arc<std::sync::atomic::AtomicBool>>>;

/// The service's whole dependency graph. Cloned cheaply (every field is an
/// `Arc`) into each spawned deployment task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ControlConfig>,
    pub store: Arc<Store>,
    pub teams: Arc<TeamRegistry>,
    pub secrets: Arc<dyn Secrets>,
    pub blobs: Arc<dyn BlobStore>,
    pub audit: Arc<dyn AuditSink>,
    pub power: Arc<DispatchingPowerDriver>,
    pub bmc_locks: Arc<BmcLocks>,
    pub orchestrator: Arc<Orchestrator>,
    pub ssh_ca: Arc<CaKeypair>,
    pub cancel_flags: Arc<CancelFlags>,
}

impl AppState {
    pub fn new(config: ControlConfig, ssh_ca: CaKeypair) -> Self {
        let power = Arc::new(DispatchingPowerDriver::new());
        let bmc_locks = Arc::new(BmcLocks::new());
        let orchestrator_config = config.orchestrator.clone();
        let orchestrator = Arc::new(Orchestrator::new(
            power.clone() as Arc<dyn power_driver::PowerDriver>,
            bmc_locks.clone(),
            orchestrator_config,
        ));
        Self {
            config: Arc::new(config),
            store: Arc::new(Store::new()),
            teams: Arc::new(TeamRegistry::default()),
            secrets: Arc::new(InMemorySecrets::default()),
            blobs: Arc::new(InMemoryBlobStore::default()),
            audit: Arc::new(LoggingAuditSink::default()),
            power,
            bmc_locks,
            orchestrator,
            ssh_ca: Arc::new(ssh_ca),
            cancel_flags: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
