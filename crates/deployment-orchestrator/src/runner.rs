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

//! The async glue that drives [`crate::decide`]'s pure phase logic forward:
//! one [`Orchestrator`] instance per `control` process, sized by
//! [`crate::config::OrchestratorConfig::max_concurrent_deployments`] (§4.4),
//! polling a [`BootEventSource`]/[`VerificationProbe`] the caller provides
//! and reporting progress through a [`ProgressSink`] after every phase step
//! so progress is persisted before the concurrency permit is released —
//! the §9 design note's "drive it from a worker pool ... one phase per
//! pass, persisting the new state before releasing the pool slot", adapted
//! to run each job as one cooperative task rather than a poll loop over a
//! store, since a single `Orchestrator` already serializes itself through
//! the semaphore.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gough_core::backoff::{retry_with_backoff, ExponentialBackoff};
use gough_core::error::Classified;
use gough_core::model::BootEvent;
use log::{info, warn};
use power_driver::{BmcCredentials, BmcLocks, BootDevice, Persistence, PowerAction, PowerDriver};
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::config::OrchestratorConfig;
use crate::decide::{self, Advance, EggDeployProgress, EggExpectation};
use crate::phase::Phase;

/// Where `BootEvent`s for a MAC are read from. `control` implements this
/// over its append-only event log.
#[async_trait]
pub trait BootEventSource: Send + Sync {
    async fn events_since(&self, mac: &str, since: DateTime<Utc>) -> Result<Vec<BootEvent>, Classified>;
}

/// The `verify` phase's two conditions, per §4.4 phase 5.
#[async_trait]
pub trait VerificationProbe: Send + Sync {
    async fn has_heartbeat_since(&self, machine_id: &str, since: DateTime<Utc>) -> Result<bool, Classified>;
    async fn probes_green(&self, machine_id: &str) -> Result<bool, Classified>;
}

/// Persists `current_phase`/`progress_percent` after every phase step, per
/// §3 invariant (iii): progress is monotonic within a run.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn record_progress(&self, job_id: &str, phase: Phase, percent: u8) -> Result<(), Classified>;
}

/// Everything one `run_job` call needs about the machine/job triple, per §3
/// "DeploymentJob".
#[derive(Debug, Clone)]
pub struct JobInputs {
    pub job_id: String,
    pub machine_id: String,
    pub mac: String,
    /// `None` for `power_type=manual`: the power_on phase is treated as
    /// already satisfied and the job proceeds straight to `pxe_boot`.
    pub bmc: Option<BmcCredentials>,
    pub eggs: Vec<EggExpectation>,
}

/// How a `run_job` call concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Complete,
    Failed { phase: Phase, message: String },
    Cancelled { phase: Phase },
}

/// Drives one [`JobInputs`] through the five §4.4 phases, bounded by
/// [`OrchestratorConfig`]'s timeouts and the cluster-wide concurrency
/// semaphore.
#[derive(Debug)]
pub struct Orchestrator {
    power: Arc<dyn PowerDriver>,
    locks: Arc<BmcLocks>,
    config: OrchestratorConfig,
    semaphore: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(power: Arc<dyn PowerDriver>, locks: Arc<BmcLocks>, config: OrchestratorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_deployments));
        Self {
            power,
            locks,
            config,
            semaphore,
        }
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs `inputs` to completion, acquiring a concurrency permit for the
    /// whole run (§4.4 "Concurrency cap"). `is_cancelled` is polled between
    /// phase steps so an operator cancel lands at the next suspension
    /// point, per §5.
    pub async fn run_job(
        &self,
        inputs: JobInputs,
        events: &dyn BootEventSource,
        verify: &dyn VerificationProbe,
        progress: &dyn ProgressSink,
        is_cancelled: &dyn Fn() -> bool,
    ) -> JobOutcome {
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed");

        // Job rows are written `pending` by the caller (§4.4 concurrency
        // cap); only now, with the permit actually held, does the job leave
        // `pending` and become visible as in-flight.
        let _ = progress
            .record_progress(&inputs.job_id, Phase::PowerOn, Phase::PowerOn.band().0)
            .await;

        if let Err(outcome) = self.run_power_on(&inputs, progress).await {
            return outcome;
        }

        for phase in [Phase::PxeBoot, Phase::OsInstall, Phase::EggDeploy, Phase::Verify] {
            if is_cancelled() {
                return JobOutcome::Cancelled { phase };
            }
            let outcome = self.run_wait_phase(phase, &inputs, events, verify, progress).await;
            if let Some(outcome) = outcome {
                return outcome;
            }
        }

        let _ = progress.record_progress(&inputs.job_id, Phase::Verify, 100).await;
        JobOutcome::Complete
    }

    async fn run_power_on(&self, inputs: &JobInputs, progress: &dyn ProgressSink) -> Result<(), JobOutcome> {
        let Some(bmc) = &inputs.bmc else {
            warn!(target: "deployment_orchestrator", "job {} has no BMC; treating power_on as manual/pre-satisfied", inputs.job_id);
            let _ = progress
                .record_progress(&inputs.job_id, Phase::PowerOn, Phase::PowerOn.band().1)
                .await;
            return Ok(());
        };

        let _guard = self.locks.acquire(&bmc.address).await;
        let attempts = self.config.retry_attempts;

        let set_boot = retry_with_backoff(attempts, ExponentialBackoff::standard(), || {
            self.power.set_next_boot(bmc, BootDevice::Pxe, Persistence::OneShot)
        })
        .await;
        if let Err(e) = set_boot {
            return Err(JobOutcome::Failed {
                phase: Phase::PowerOn,
                message: format!("set_next_boot failed: {e}"),
            });
        }

        let cycle = retry_with_backoff(attempts, ExponentialBackoff::standard(), || {
            self.power.power(bmc, PowerAction::Cycle)
        })
        .await;
        if let Err(e) = cycle {
            return Err(JobOutcome::Failed {
                phase: Phase::PowerOn,
                message: format!("power cycle failed: {e}"),
            });
        }

        info!(target: "deployment_orchestrator", "job {} powered on via {}", inputs.job_id, bmc.address);
        let _ = progress
            .record_progress(&inputs.job_id, Phase::PowerOn, Phase::PowerOn.band().1)
            .await;
        Ok(())
    }

    async fn run_wait_phase(
        &self,
        phase: Phase,
        inputs: &JobInputs,
        events: &dyn BootEventSource,
        verify: &dyn VerificationProbe,
        progress: &dyn ProgressSink,
    ) -> Option<JobOutcome> {
        let started_at = Utc::now();
        let timeout = self.config.timeout_for(phase);
        let mut last_progress = phase.band().0;

        loop {
            let elapsed = (Utc::now() - started_at)
                .to_std()
                .unwrap_or(StdDuration::from_secs(0));

            let advance = match phase {
                Phase::PxeBoot => {
                    let ev = events.events_since(&inputs.mac, started_at).await.ok()?;
                    decide::pxe_boot_advance(&ev, elapsed, timeout)
                }
                Phase::OsInstall => {
                    let ev = events.events_since(&inputs.mac, started_at).await.ok()?;
                    decide::os_install_advance(&ev, elapsed, timeout)
                }
                Phase::EggDeploy => {
                    let ev = events.events_since(&inputs.mac, started_at).await.ok()?;
                    let (advance, prog) = decide::egg_deploy_advance(&ev, &inputs.eggs, elapsed, timeout);
                    let pct = egg_progress_percent(phase, &prog);
                    if pct > last_progress {
                        last_progress = pct;
                        let _ = progress.record_progress(&inputs.job_id, phase, pct).await;
                    }
                    advance
                }
                Phase::Verify => {
                    let has_heartbeat = verify
                        .has_heartbeat_since(&inputs.machine_id, started_at)
                        .await
                        .unwrap_or(false);
                    let probes_green = verify.probes_green(&inputs.machine_id).await.unwrap_or(false);
                    decide::verify_advance(has_heartbeat, probes_green, elapsed, timeout)
                }
                Phase::PowerOn => unreachable!("power_on has its own non-polling path"),
            };

            match advance {
                Advance::Proceed => {
                    let (_, end) = phase.band();
                    if end > last_progress {
                        let _ = progress.record_progress(&inputs.job_id, phase, end).await;
                    }
                    return None;
                }
                Advance::Continue => {
                    sleep(self.config.poll_interval).await;
                    continue;
                }
                Advance::TimedOut => {
                    return Some(JobOutcome::Failed {
                        phase,
                        message: decide::timeout_message(phase),
                    });
                }
                Advance::Failed(message) => {
                    return Some(JobOutcome::Failed { phase, message });
                }
            }
        }
    }
}

fn egg_progress_percent(phase: Phase, progress: &EggDeployProgress) -> u8 {
    if progress.total == 0 {
        return phase.band().1;
    }
    phase.scale_progress(progress.completed as f64 / progress.total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gough_core::model::BootEventType;
    use power_driver::{PowerError, PowerState};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePower {
        power_calls: AtomicUsize,
    }

    #[async_trait]
    impl PowerDriver for FakePower {
        async fn power(&self, _bmc: &BmcCredentials, _action: PowerAction) -> Result<PowerState, PowerError> {
            self.power_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PowerState::On)
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

    struct FakeEvents(Mutex<Vec<BootEvent>>);

    #[async_trait]
    impl BootEventSource for FakeEvents {
        async fn events_since(&self, _mac: &str, _since: DateTime<Utc>) -> Result<Vec<BootEvent>, Classified> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    struct FakeVerify {
        heartbeat: AtomicBool,
        probes: AtomicBool,
    }

    #[async_trait]
    impl VerificationProbe for FakeVerify {
        async fn has_heartbeat_since(&self, _machine_id: &str, _since: DateTime<Utc>) -> Result<bool, Classified> {
            Ok(self.heartbeat.load(Ordering::SeqCst))
        }

        async fn probes_green(&self, _machine_id: &str) -> Result<bool, Classified> {
            Ok(self.probes.load(Ordering::SeqCst))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        updates: Mutex<Vec<(Phase, u8)>>,
    }

    #[async_trait]
    impl ProgressSink for RecordingProgress {
        async fn record_progress(&self, _job_id: &str, phase: Phase, percent: u8) -> Result<(), Classified> {
            self.updates.lock().unwrap().push((phase, percent));
            Ok(())
        }
    }

    fn event(event_type: BootEventType, details: serde_json::Value) -> BootEvent {
        BootEvent {
            machine_id: Some("m1".into()),
            mac: "aabbcc112233".into(),
            ip: None,
            event_type,
            details,
            status: "ok".into(),
            timestamp: Utc::now(),
        }
    }

    fn test_config() -> OrchestratorConfig {
        OrchestratorConfig {
            power_on_timeout: StdDuration::from_millis(200),
            pxe_boot_timeout: StdDuration::from_millis(200),
            os_install_timeout: StdDuration::from_millis(200),
            egg_deploy_timeout: StdDuration::from_millis(200),
            verify_timeout: StdDuration::from_millis(200),
            poll_interval: StdDuration::from_millis(5),
            max_concurrent_deployments: 2,
            retry_attempts: 2,
        }
    }

    #[tokio::test]
    async fn full_happy_path_completes() {
        let events = FakeEvents(Mutex::new(vec![
            event(BootEventType::BootStart, serde_json::json!({})),
            event(BootEventType::OsInstalled, serde_json::json!({})),
            event(BootEventType::EggComplete, serde_json::json!({"egg_name": "base"})),
        ]));
        let verify = FakeVerify {
            heartbeat: AtomicBool::new(true),
            probes: AtomicBool::new(true),
        };
        let progress = RecordingProgress::default();
        let orchestrator = Orchestrator::new(
            Arc::new(FakePower::default()),
            Arc::new(BmcLocks::new()),
            test_config(),
        );

        let inputs = JobInputs {
            job_id: "job-1".into(),
            machine_id: "m1".into(),
            mac: "aabbcc112233".into(),
            bmc: Some(BmcCredentials {
                address: "10.0.0.5".into(),
                username: "admin".into(),
                password: "admin".into(),
                power_type: gough_core::model::PowerType::Ipmi,
            }),
            eggs: vec![EggExpectation {
                egg_name: "base".into(),
                ignore_errors: false,
            }],
        };

        let outcome = orchestrator
            .run_job(inputs, &events, &verify, &progress, &|| false)
            .await;
        assert_eq!(outcome, JobOutcome::Complete);
        assert_eq!(progress.updates.lock().unwrap().last(), Some(&(Phase::Verify, 100)));
    }

    #[tokio::test]
    async fn pxe_boot_timeout_fails_the_job_in_that_phase() {
        let events = FakeEvents(Mutex::new(vec![]));
        let verify = FakeVerify {
            heartbeat: AtomicBool::new(false),
            probes: AtomicBool::new(false),
        };
        let progress = RecordingProgress::default();
        let orchestrator = Orchestrator::new(
            Arc::new(FakePower::default()),
            Arc::new(BmcLocks::new()),
            test_config(),
        );
        let inputs = JobInputs {
            job_id: "job-2".into(),
            machine_id: "m2".into(),
            mac: "aabbcc112233".into(),
            bmc: None,
            eggs: vec![],
        };

        let outcome = orchestrator
            .run_job(inputs, &events, &verify, &progress, &|| false)
            .await;
        assert_eq!(
            outcome,
            JobOutcome::Failed {
                phase: Phase::PxeBoot,
                message: decide::timeout_message(Phase::PxeBoot),
            }
        );
    }

    #[tokio::test]
    async fn cancellation_is_observed_between_phases() {
        let events = FakeEvents(Mutex::new(vec![event(BootEventType::BootStart, serde_json::json!({}))]));
        let verify = FakeVerify {
            heartbeat: AtomicBool::new(false),
            probes: AtomicBool::new(false),
        };
        let progress = RecordingProgress::default();
        let orchestrator = Orchestrator::new(
            Arc::new(FakePower::default()),
            Arc::new(BmcLocks::new()),
            test_config(),
        );
        let inputs = JobInputs {
            job_id: "job-3".into(),
            machine_id: "m3".into(),
            mac: "aabbcc112233".into(),
            bmc: None,
            eggs: vec![],
        };

        let outcome = orchestrator
            .run_job(inputs, &events, &verify, &progress, &|| true)
            .await;
        assert!(matches!(outcome, JobOutcome::Cancelled { .. }));
    }
}
