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

//! The §4.2 transition table, as a pure function from `(status, trigger)` to
//! a new status. Callers (`control`) own persistence; this module only
//! knows which edges exist and what they require.

use gough_core::model::MachineStatus;
use thiserror::Error;

/// Every trigger the §4.2 table names. Each carries exactly the data the
/// transition needs to check its precondition.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// `dhcp_request with unknown MAC`.
    DhcpRequestUnknownMac,
    /// `operator/commission command`.
    Commission,
    /// `os_installed event from commission run`, precondition `hardware_info
    /// captured` is checked by the caller before calling `transition`.
    CommissionComplete,
    /// `deploy command (image, eggs)`.
    Deploy,
    /// `deployment_complete event`.
    DeploymentComplete,
    /// `error event OR job timeout`.
    DeploymentFailed,
    /// `release command`.
    Release,
    /// `retry command`.
    Retry,
    /// `hard-reset command`, requires the `admin` capability — checked by
    /// the caller, not this pure function.
    HardReset,
}

/// Why a requested transition was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no transition for trigger {trigger:?} from status {from:?}")]
    NoSuchEdge {
        from: MachineStatus,
        trigger: String,
    },

    /// `ready --deploy-->` and `failed --retry-->` both require no
    /// non-terminal job already running for the machine (§8 property 6).
    #[error("machine already has a non-terminal deployment job")]
    JobAlreadyActive,
}

/// Applies `trigger` to `from`, given whether the machine already has a
/// non-terminal `DeploymentJob` (the only piece of cross-aggregate state
/// this pure function needs to know about). Returns the new status or a
/// [`TransitionError`] if the edge doesn't exist in §4.2's table.
pub fn transition(
    from: MachineStatus,
    trigger: &Trigger,
    has_active_job: bool,
) -> Result<MachineStatus, TransitionError> {
    use MachineStatus::*;
    use Trigger::*;

    // `any --hard-reset--> discovered` applies regardless of current status.
    if matches!(trigger, HardReset) {
        return Ok(Discovered);
    }

    match (from, trigger) {
        (Unknown, DhcpRequestUnknownMac) => Ok(Discovered),
        (Discovered, Commission) => Ok(Commissioning),
        (Commissioning, CommissionComplete) => Ok(Ready),
        (Ready, Deploy) => {
            if has_active_job {
                Err(TransitionError::JobAlreadyActive)
            } else {
                Ok(Deploying)
            }
        }
        (Deploying, DeploymentComplete) => Ok(Deployed),
        (Deploying, DeploymentFailed) => Ok(Failed),
        (Deployed, Release) => Ok(Ready),
        (Failed, Retry) => {
            if has_active_job {
                Err(TransitionError::JobAlreadyActive)
            } else {
                Ok(Deploying)
            }
        }
        (from, trigger) => Err(TransitionError::NoSuchEdge {
            from,
            trigger: format!("{trigger:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn discovery_edge() {
        assert_eq!(
            transition(MachineStatus::Unknown, &Trigger::DhcpRequestUnknownMac, false),
            Ok(MachineStatus::Discovered)
        );
    }

    #[test]
    fn full_happy_path() {
        let mut status = MachineStatus::Unknown;
        for (trigger, active_job) in [
            (Trigger::DhcpRequestUnknownMac, false),
            (Trigger::Commission, false),
            (Trigger::CommissionComplete, false),
            (Trigger::Deploy, false),
            (Trigger::DeploymentComplete, true),
        ] {
            status = transition(status, &trigger, active_job).unwrap();
        }
        assert_eq!(status, MachineStatus::Deployed);
    }

    #[test]
    fn deploy_rejected_when_job_already_active() {
        let err = transition(MachineStatus::Ready, &Trigger::Deploy, true).unwrap_err();
        assert_eq!(err, TransitionError::JobAlreadyActive);
    }

    #[test]
    fn hard_reset_works_from_any_status() {
        for status in [
            MachineStatus::Unknown,
            MachineStatus::Discovered,
            MachineStatus::Commissioning,
            MachineStatus::Ready,
            MachineStatus::Deploying,
            MachineStatus::Deployed,
            MachineStatus::Failed,
        ] {
            assert_eq!(
                transition(status, &Trigger::HardReset, true),
                Ok(MachineStatus::Discovered)
            );
        }
    }

    #[test]
    fn unknown_edge_is_rejected() {
        let err = transition(MachineStatus::Ready, &Trigger::DhcpRequestUnknownMac, false).unwrap_err();
        assert!(matches!(err, TransitionError::NoSuchEdge { .. }));
    }

    #[test]
    fn retry_from_failed_reopens_deploying() {
        assert_eq!(
            transition(MachineStatus::Failed, &Trigger::Retry, false),
            Ok(MachineStatus::Deploying)
        );
    }

    #[test]
    fn release_returns_deployed_machine_to_ready() {
        assert_eq!(
            transition(MachineStatus::Deployed, &Trigger::Release, false),
            Ok(MachineStatus::Ready)
        );
    }
}
