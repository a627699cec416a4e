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

//! `release` on a deployed machine, per §4.4: stop services, remove
//! installed eggs in reverse order, restore the default boot config, then
//! release power. Same phase/timeout/retry shape as a forward deployment,
//! reusing [`OrchestratorConfig::retry_attempts`] and the `egg_deploy`
//! timeout as the bound for the per-egg teardown loop.

use std::sync::Arc;

use async_trait::async_trait;
use gough_core::backoff::{retry_with_backoff, ExponentialBackoff};
use gough_core::error::Classified;
use log::{info, warn};
use power_driver::{BmcCredentials, BmcLocks, BootDevice, Persistence, PowerAction, PowerDriver};

use crate::config::OrchestratorConfig;

/// The host-side actions a rollback drives, implemented by `control` against
/// the deployed machine's agent/management channel. Out of scope for this
/// crate to perform directly — it only sequences and retries the calls.
#[async_trait]
pub trait RollbackActions: Send + Sync {
    async fn stop_services(&self, machine_id: &str) -> Result<(), Classified>;
    async fn remove_egg(&self, machine_id: &str, egg_name: &str) -> Result<(), Classified>;
    async fn restore_default_boot_config(&self, machine_id: &str) -> Result<(), Classified>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    Released,
    Failed { step: &'static str, message: String },
}

#[derive(Debug)]
pub struct RollbackRunner {
    power: Arc<dyn PowerDriver>,
    locks: Arc<BmcLocks>,
    retry_attempts: usize,
}

impl RollbackRunner {
    pub fn new(power: Arc<dyn PowerDriver>, locks: Arc<BmcLocks>, config: &OrchestratorConfig) -> Self {
        Self {
            power,
            locks,
            retry_attempts: config.retry_attempts,
        }
    }

    /// Runs the four-step teardown. `installed_eggs` must already be in
    /// deploy order; they are removed in reverse.
    pub async fn run(
        &self,
        machine_id: &str,
        installed_eggs: &[String],
        bmc: Option<&BmcCredentials>,
        actions: &dyn RollbackActions,
    ) -> RollbackOutcome {
        if let Err(e) = actions.stop_services(machine_id).await {
            return RollbackOutcome::Failed {
                step: "stop_services",
                message: e.to_string(),
            };
        }

        for egg_name in installed_eggs.iter().rev() {
            if let Err(e) = actions.remove_egg(machine_id, egg_name).await {
                return RollbackOutcome::Failed {
                    step: "remove_egg",
                    message: format!("{egg_name}: {e}"),
                };
            }
        }

        if let Err(e) = actions.restore_default_boot_config(machine_id).await {
            return RollbackOutcome::Failed {
                step: "restore_default_boot_config",
                message: e.to_string(),
            };
        }

        let Some(bmc) = bmc else {
            warn!(target: "deployment_orchestrator::rollback", "machine {machine_id} has no BMC; skipping power release");
            return RollbackOutcome::Released;
        };

        let _guard = self.locks.acquire(&bmc.address).await;
        let result = retry_with_backoff(self.retry_attempts, ExponentialBackoff::standard(), || {
            self.power.set_next_boot(bmc, BootDevice::Disk, Persistence::Persistent)
        })
        .await;
        if let Err(e) = result {
            return RollbackOutcome::Failed {
                step: "restore_default_boot_config",
                message: format!("set_next_boot(disk) failed: {e}"),
            };
        }

        let result = retry_with_backoff(self.retry_attempts, ExponentialBackoff::standard(), || {
            self.power.power(bmc, PowerAction::Off)
        })
        .await;
        match result {
            Ok(_) => {
                info!(target: "deployment_orchestrator::rollback", "machine {machine_id} released");
                RollbackOutcome::Released
            }
            Err(e) => RollbackOutcome::Failed {
                step: "release_power",
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use power_driver::{PowerError, PowerState};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePower;

    #[async_trait]
    impl PowerDriver for FakePower {
        async fn power(&self, _bmc: &BmcCredentials, _action: PowerAction) -> Result<PowerState, PowerError> {
            Ok(PowerState::Off)
        }

        async fn set_next_boot(
            &self,
            _bmc: &BmcCredentials,
            _device: BootDevice,
            _persistence: Persistence,
        ) -> Result<(), PowerError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingActions {
        removed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RollbackActions for RecordingActions {
        async fn stop_services(&self, _machine_id: &str) -> Result<(), Classified> {
            Ok(())
        }

        async fn remove_egg(&self, _machine_id: &str, egg_name: &str) -> Result<(), Classified> {
            self.removed.lock().unwrap().push(egg_name.to_string());
            Ok(())
        }

        async fn restore_default_boot_config(&self, _machine_id: &str) -> Result<(), Classified> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn eggs_are_removed_in_reverse_order() {
        let runner = RollbackRunner::new(
            Arc::new(FakePower),
            Arc::new(BmcLocks::new()),
            &OrchestratorConfig::default(),
        );
        let actions = RecordingActions::default();
        let eggs = vec!["base".to_string(), "web".to_string()];

        let outcome = runner.run("m1", &eggs, None, &actions).await;
        assert_eq!(outcome, RollbackOutcome::Released);
        assert_eq!(*actions.removed.lock().unwrap(), vec!["web".to_string(), "base".to_string()]);
    }

    #[tokio::test]
    async fn no_bmc_skips_power_release_but_still_succeeds() {
        let runner = RollbackRunner::new(
            Arc::new(FakePower),
            Arc::new(BmcLocks::new()),
            &OrchestratorConfig::default(),
        );
        let actions = RecordingActions::default();
        let outcome = runner.run("m1", &[], None, &actions).await;
        assert_eq!(outcome, RollbackOutcome::Released);
    }
}
