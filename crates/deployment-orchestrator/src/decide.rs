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

//! Pure per-phase advance decisions: given the `BootEvent`s observed so far
//! for a MAC (consumed in arrival order, §5) and how long the phase has
//! been open, decide whether to keep waiting, advance, or time out. No I/O
//! — [`crate::runner::Orchestrator`] is the only thing that calls the
//! clock or touches a store.

use std::time::Duration;

use gough_core::model::{BootEvent, BootEventType};

use crate::phase::Phase;

/// What a phase-advance check resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Keep waiting; nothing new to act on yet.
    Continue,
    /// The phase's completion condition was observed; move to the next
    /// phase (or to `complete` if this was the last one).
    Proceed,
    /// The phase's own timeout elapsed with no satisfying event.
    TimedOut,
    /// A terminal failure was observed (an `error` BootEvent, or a critical
    /// egg failing without `ignore_errors`).
    Failed(String),
}

/// §4.4 phase 2: wait for a `boot_start` event for this MAC.
pub fn pxe_boot_advance(events: &[BootEvent], elapsed: Duration, timeout: Duration) -> Advance {
    if let Some(err) = first_error(events) {
        return Advance::Failed(err);
    }
    if events.iter().any(|e| e.event_type == BootEventType::BootStart) {
        return Advance::Proceed;
    }
    timeout_or_continue(elapsed, timeout)
}

/// §4.4 phase 3: wait for `os_installed`.
pub fn os_install_advance(events: &[BootEvent], elapsed: Duration, timeout: Duration) -> Advance {
    if let Some(err) = first_error(events) {
        return Advance::Failed(err);
    }
    if events.iter().any(|e| e.event_type == BootEventType::OsInstalled) {
        return Advance::Proceed;
    }
    timeout_or_continue(elapsed, timeout)
}

/// One resolved egg's expected name and whether its failure is tolerable,
/// per §4.4's `ignore_errors` flag.
#[derive(Debug, Clone)]
pub struct EggExpectation {
    pub egg_name: String,
    pub ignore_errors: bool,
}

/// Progress within the `egg_deploy` phase: how many of the expected eggs
/// have completed (in the expected order, §5), which were skipped after a
/// tolerated failure, and whether a critical (non-tolerated) failure
/// occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EggDeployProgress {
    pub completed: usize,
    pub total: usize,
    pub skipped: Vec<String>,
}

/// §4.4 phase 4: an `egg_started`/`egg_complete` pair per resolved egg, in
/// the expected order. An egg's `error` event is tolerated (marked skipped,
/// job continues) if that egg's `ignore_errors` is set; otherwise it's
/// terminal, per §7 partial-failure semantics.
pub fn egg_deploy_advance(
    events: &[BootEvent],
    expected: &[EggExpectation],
    elapsed: Duration,
    timeout: Duration,
) -> (Advance, EggDeployProgress) {
    let mut completed = 0;
    let mut skipped = Vec::new();

    for expectation in expected {
        let egg_events: Vec<&BootEvent> = events
            .iter()
            .filter(|e| event_egg_name(e).as_deref() == Some(expectation.egg_name.as_str()))
            .collect();

        let failed = egg_events.iter().any(|e| e.event_type == BootEventType::Error);
        let done = egg_events
            .iter()
            .any(|e| e.event_type == BootEventType::EggComplete);

        if failed {
            if expectation.ignore_errors {
                skipped.push(expectation.egg_name.clone());
                completed += 1;
                continue;
            }
            let progress = EggDeployProgress {
                completed,
                total: expected.len(),
                skipped: skipped.clone(),
            };
            return (
                Advance::Failed(format!("egg {} failed and is not ignore_errors", expectation.egg_name)),
                progress,
            );
        }

        if done {
            completed += 1;
        } else {
            // This egg (and every egg after it, since they deploy in
            // order) hasn't completed yet; stop counting here.
            break;
        }
    }

    let progress = EggDeployProgress {
        completed,
        total: expected.len(),
        skipped,
    };

    if progress.completed == progress.total {
        return (Advance::Proceed, progress);
    }

    (timeout_or_continue(elapsed, timeout), progress)
}

/// §4.4 phase 5: at least one agent heartbeat and every configured probe
/// green, within the verify window.
pub fn verify_advance(has_heartbeat: bool, probes_green: bool, elapsed: Duration, timeout: Duration) -> Advance {
    if has_heartbeat && probes_green {
        return Advance::Proceed;
    }
    timeout_or_continue(elapsed, timeout)
}

fn timeout_or_continue(elapsed: Duration, timeout: Duration) -> Advance {
    if elapsed >= timeout {
        Advance::TimedOut
    } else {
        Advance::Continue
    }
}

fn first_error(events: &[BootEvent]) -> Option<String> {
    events
        .iter()
        .find(|e| e.event_type == BootEventType::Error)
        .map(|e| {
            e.details
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("boot error")
                .to_string()
        })
}

fn event_egg_name(event: &BootEvent) -> Option<String> {
    event
        .details
        .get("egg_name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// A timed-out or failed phase always maps to the job's terminal
/// `error_message`, identifying which phase it happened in, per §4.4.
pub fn timeout_message(phase: Phase) -> String {
    format!("{} phase timed out", phase.label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gough_core::model::BootEventType;

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

    #[test]
    fn pxe_boot_waits_then_proceeds_on_boot_start() {
        let none: Vec<BootEvent> = vec![];
        assert_eq!(
            pxe_boot_advance(&none, Duration::from_secs(1), Duration::from_secs(60)),
            Advance::Continue
        );
        let with_start = vec![event(BootEventType::BootStart, serde_json::json!({}))];
        assert_eq!(
            pxe_boot_advance(&with_start, Duration::from_secs(1), Duration::from_secs(60)),
            Advance::Proceed
        );
    }

    #[test]
    fn pxe_boot_times_out() {
        let none: Vec<BootEvent> = vec![];
        assert_eq!(
            pxe_boot_advance(&none, Duration::from_secs(61), Duration::from_secs(60)),
            Advance::TimedOut
        );
    }

    #[test]
    fn error_event_fails_the_phase_immediately_even_before_timeout() {
        let events = vec![event(
            BootEventType::Error,
            serde_json::json!({"message": "disk not found"}),
        )];
        let advance = os_install_advance(&events, Duration::from_secs(1), Duration::from_secs(600));
        assert_eq!(advance, Advance::Failed("disk not found".to_string()));
    }

    fn expectations(names: &[&str], ignore: &[&str]) -> Vec<EggExpectation> {
        names
            .iter()
            .map(|n| EggExpectation {
                egg_name: n.to_string(),
                ignore_errors: ignore.contains(n),
            })
            .collect()
    }

    #[test]
    fn egg_deploy_proceeds_once_every_egg_completes_in_order() {
        let expected = expectations(&["base", "web"], &[]);
        let events = vec![
            event(BootEventType::EggStarted, serde_json::json!({"egg_name": "base"})),
            event(BootEventType::EggComplete, serde_json::json!({"egg_name": "base"})),
            event(BootEventType::EggStarted, serde_json::json!({"egg_name": "web"})),
            event(BootEventType::EggComplete, serde_json::json!({"egg_name": "web"})),
        ];
        let (advance, progress) =
            egg_deploy_advance(&events, &expected, Duration::from_secs(1), Duration::from_secs(60));
        assert_eq!(advance, Advance::Proceed);
        assert_eq!(progress.completed, 2);
        assert!(progress.skipped.is_empty());
    }

    #[test]
    fn ignore_errors_egg_failure_is_skipped_not_terminal() {
        let expected = expectations(&["base", "flaky"], &["flaky"]);
        let events = vec![
            event(BootEventType::EggComplete, serde_json::json!({"egg_name": "base"})),
            event(BootEventType::Error, serde_json::json!({"egg_name": "flaky"})),
        ];
        let (advance, progress) =
            egg_deploy_advance(&events, &expected, Duration::from_secs(1), Duration::from_secs(60));
        assert_eq!(advance, Advance::Proceed);
        assert_eq!(progress.skipped, vec!["flaky".to_string()]);
    }

    #[test]
    fn critical_egg_failure_is_terminal() {
        let expected = expectations(&["base", "critical"], &[]);
        let events = vec![
            event(BootEventType::EggComplete, serde_json::json!({"egg_name": "base"})),
            event(BootEventType::Error, serde_json::json!({"egg_name": "critical"})),
        ];
        let (advance, _) =
            egg_deploy_advance(&events, &expected, Duration::from_secs(1), Duration::from_secs(60));
        assert!(matches!(advance, Advance::Failed(_)));
    }

    #[test]
    fn verify_requires_both_heartbeat_and_green_probes() {
        assert_eq!(
            verify_advance(true, false, Duration::from_secs(1), Duration::from_secs(300)),
            Advance::Continue
        );
        assert_eq!(
            verify_advance(true, true, Duration::from_secs(1), Duration::from_secs(300)),
            Advance::Proceed
        );
    }
}
