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

//! The five in-flight phases of §4.4, each mapped onto a band of
//! `progress_percent` so progress stays monotone across phase boundaries
//! (§8 property 2).

use gough_core::model::DeploymentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PowerOn,
    PxeBoot,
    OsInstall,
    EggDeploy,
    Verify,
}

impl Phase {
    pub const ORDER: [Phase; 5] = [
        Phase::PowerOn,
        Phase::PxeBoot,
        Phase::OsInstall,
        Phase::EggDeploy,
        Phase::Verify,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::PowerOn => "power_on",
            Self::PxeBoot => "pxe_boot",
            Self::OsInstall => "os_install",
            Self::EggDeploy => "egg_deploy",
            Self::Verify => "verify",
        }
    }

    pub fn status(self) -> DeploymentStatus {
        match self {
            Self::PowerOn => DeploymentStatus::PowerOn,
            Self::PxeBoot => DeploymentStatus::PxeBoot,
            Self::OsInstall => DeploymentStatus::OsInstall,
            Self::EggDeploy => DeploymentStatus::EggDeploy,
            Self::Verify => DeploymentStatus::EggDeploy,
        }
    }

    pub fn next(self) -> Option<Phase> {
        let idx = Self::ORDER.iter().position(|p| *p == self)?;
        Self::ORDER.get(idx + 1).copied()
    }

    /// The `[start, end)` progress band this phase owns, out of 100. Five
    /// equal bands; `verify` rides the tail of `egg_deploy`'s status but
    /// gets its own band so 100 is reserved for `complete` (§8 property 2:
    /// progress reaches 100 iff `status=complete`).
    pub fn band(self) -> (u8, u8) {
        let idx = Self::ORDER.iter().position(|p| *p == self).unwrap() as u8;
        let width = 100 / Self::ORDER.len() as u8;
        let start = idx * width;
        let end = if self == Phase::Verify { 99 } else { start + width };
        (start, end)
    }

    /// Scales a `0..=1` fraction of completion-within-phase into this
    /// phase's progress band.
    pub fn scale_progress(self, fraction_done: f64) -> u8 {
        let (start, end) = self.band();
        let fraction_done = fraction_done.clamp(0.0, 1.0);
        start + ((end - start) as f64 * fraction_done).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bands_are_monotone_and_non_overlapping() {
        let mut last_end = 0;
        for phase in Phase::ORDER {
            let (start, end) = phase.band();
            assert!(start >= last_end);
            assert!(end >= start);
            last_end = end;
        }
    }

    #[test]
    fn verify_band_never_reaches_100() {
        let (_, end) = Phase::Verify.band();
        assert!(end < 100);
    }

    #[test]
    fn scale_progress_stays_within_band() {
        let (start, end) = Phase::EggDeploy.band();
        assert_eq!(Phase::EggDeploy.scale_progress(0.0), start);
        assert_eq!(Phase::EggDeploy.scale_progress(1.0), end);
    }

    #[test]
    fn next_walks_the_fixed_order() {
        assert_eq!(Phase::PowerOn.next(), Some(Phase::PxeBoot));
        assert_eq!(Phase::Verify.next(), None);
    }
}
