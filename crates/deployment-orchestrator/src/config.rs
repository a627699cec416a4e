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

//! Runtime configuration, built once at startup and passed into
//! [`crate::runner::Orchestrator`] by reference — never global mutable
//! state, per the spec's §9 design note on configuration.

use std::time::Duration;

use crate::phase::Phase;

/// Per-phase timeouts and the cluster-wide concurrency cap, per §4.4.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub power_on_timeout: Duration,
    pub pxe_boot_timeout: Duration,
    pub os_install_timeout: Duration,
    pub egg_deploy_timeout: Duration,
    pub verify_timeout: Duration,
    /// How often a job in-flight re-checks its trigger source (BootEvents,
    /// heartbeats) while waiting inside a phase. Not part of the spec's
    /// named knobs; chosen short enough that phase transitions feel live.
    pub poll_interval: Duration,
    /// §4.4: at most this many jobs may be in non-terminal status
    /// cluster-wide; excess commands queue FIFO.
    pub max_concurrent_deployments: usize,
    /// §4.1/§5: attempts for any bounded-retry external call a phase makes.
    pub retry_attempts: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            power_on_timeout: Duration::from_secs(5 * 60),
            pxe_boot_timeout: Duration::from_secs(10 * 60),
            os_install_timeout: Duration::from_secs(30 * 60),
            egg_deploy_timeout: Duration::from_secs(30 * 60),
            verify_timeout: Duration::from_secs(5 * 60),
            poll_interval: Duration::from_secs(2),
            max_concurrent_deployments: 5,
            retry_attempts: 4,
        }
    }
}

impl OrchestratorConfig {
    pub fn timeout_for(&self, phase: Phase) -> Duration {
        match phase {
            Phase::PowerOn => self.power_on_timeout,
            Phase::PxeBoot => self.pxe_boot_timeout,
            Phase::OsInstall => self.os_install_timeout,
            Phase::EggDeploy => self.egg_deploy_timeout,
            Phase::Verify => self.verify_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_figures() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.timeout_for(Phase::PowerOn), Duration::from_secs(300));
        assert_eq!(cfg.timeout_for(Phase::PxeBoot), Duration::from_secs(600));
        assert_eq!(cfg.timeout_for(Phase::OsInstall), Duration::from_secs(1800));
        assert_eq!(cfg.timeout_for(Phase::EggDeploy), Duration::from_secs(1800));
        assert_eq!(cfg.timeout_for(Phase::Verify), Duration::from_secs(300));
        assert_eq!(cfg.max_concurrent_deployments, 5);
    }
}
