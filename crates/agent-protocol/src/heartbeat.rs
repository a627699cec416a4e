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

//! The missed-heartbeat bookkeeping shared by both the worker heartbeat
//! (§3 "Worker") and the agent heartbeat (§3 "Agent", §4.5): N consecutive
//! missed beats flips a liveness flag, and a heartbeat received while down
//! revives it silently (§6 scenario S6). Pure so both call sites and tests
//! share one implementation of the rule.

use chrono::{DateTime, Duration, Utc};

/// Missed-heartbeat threshold before a worker/agent is marked
/// suspect/offline, per §3 and §4.5: 5 consecutive missed beats.
pub const DEFAULT_MISSED_THRESHOLD: u32 = 5;

/// The result of accepting one heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatOutcome {
    pub last_heartbeat_at: DateTime<Utc>,
    pub consecutive_missed: u32,
    pub revived: bool,
}

/// Records a successful heartbeat: resets the missed counter to zero and
/// reports whether this heartbeat revived a previously-down peer.
pub fn record_heartbeat(was_down: bool, now: DateTime<Utc>) -> HeartbeatOutcome {
    HeartbeatOutcome {
        last_heartbeat_at: now,
        consecutive_missed: 0,
        revived: was_down,
    }
}

/// Given the last observed heartbeat and an expected interval, computes how
/// many beats have been missed as of `now`. A scheduler calls this
/// periodically (not on every request) to decide whether to flip a peer to
/// suspect/offline.
pub fn missed_count(last_heartbeat_at: Option<DateTime<Utc>>, interval: Duration, now: DateTime<Utc>) -> u32 {
    let Some(last) = last_heartbeat_at else {
        return DEFAULT_MISSED_THRESHOLD;
    };
    let elapsed = now - last;
    if elapsed <= interval {
        0
    } else {
        (elapsed.num_milliseconds() / interval.num_milliseconds().max(1)) as u32
    }
}

/// Whether `missed` consecutive misses crosses the threshold that flips a
/// peer to suspect/offline.
pub fn is_down(missed: u32, threshold: u32) -> bool {
    missed >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missed_count_is_zero_within_one_interval() {
        let now = Utc::now();
        let last = now - Duration::seconds(10);
        assert_eq!(missed_count(Some(last), Duration::seconds(30), now), 0);
    }

    #[test]
    fn five_missed_intervals_crosses_threshold() {
        let now = Utc::now();
        let last = now - Duration::seconds(30 * 5 + 1);
        let missed = missed_count(Some(last), Duration::seconds(30), now);
        assert!(is_down(missed, DEFAULT_MISSED_THRESHOLD));
    }

    #[test]
    fn never_seen_is_treated_as_down() {
        let now = Utc::now();
        assert!(is_down(
            missed_count(None, Duration::seconds(30), now),
            DEFAULT_MISSED_THRESHOLD
        ));
    }

    #[test]
    fn heartbeat_while_down_revives_silently() {
        let outcome = record_heartbeat(true, Utc::now());
        assert!(outcome.revived);
        assert_eq!(outcome.consecutive_missed, 0);
    }

    #[test]
    fn heartbeat_while_up_is_not_a_revival() {
        let outcome = record_heartbeat(false, Utc::now());
        assert!(!outcome.revived);
    }
}
