//! Mission aggregator
//!
//! Cumulative summary of the walkthrough. Changed only by merging partial patches;
//! fields a patch does not mention keep their value.

use crate::error::MissionError;
use serde::{Deserialize, Serialize};

/// Highest legal progress value
pub const MAX_PROGRESS: u8 = 100;

/// Cumulative migration summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionState {
    pub phase: String,
    pub progress: u8,
    pub parity: String,
    pub needs_confirmation: u32,
    pub jobs_running: u32,
}

impl MissionState {
    /// State before anything has been scanned
    #[must_use]
    pub fn initial() -> Self {
        Self {
            phase: "CPQ Reality".to_string(),
            progress: 0,
            parity: "—".to_string(),
            needs_confirmation: 0,
            jobs_running: 0,
        }
    }
}

impl Default for MissionState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Partial update to [`MissionState`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_confirmation: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs_running: Option<u32>,
}

impl MissionPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that overwrites every field with `state`
    #[must_use]
    pub fn reset_to(state: MissionState) -> Self {
        Self {
            phase: Some(state.phase),
            progress: Some(state.progress),
            parity: Some(state.parity),
            needs_confirmation: Some(state.needs_confirmation),
            jobs_running: Some(state.jobs_running),
        }
    }

    #[must_use]
    pub fn phase(mut self, phase: &str) -> Self {
        self.phase = Some(phase.to_string());
        self
    }

    #[must_use]
    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn parity(mut self, parity: &str) -> Self {
        self.parity = Some(parity.to_string());
        self
    }

    #[must_use]
    pub fn needs_confirmation(mut self, count: u32) -> Self {
        self.needs_confirmation = Some(count);
        self
    }

    #[must_use]
    pub fn jobs_running(mut self, count: u32) -> Self {
        self.jobs_running = Some(count);
        self
    }

    /// Whether the patch touches nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Owner of the current [`MissionState`]
#[derive(Debug, Clone, Default)]
pub struct MissionAggregator {
    state: MissionState,
    inconsistencies: u64,
}

impl MissionAggregator {
    /// Aggregator at the initial state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &MissionState {
        &self.state
    }

    /// Number of rejected out-of-range patches so far
    #[inline]
    #[must_use]
    pub fn inconsistencies(&self) -> u64 {
        self.inconsistencies
    }

    /// Merge a patch
    ///
    /// An out-of-range progress is not applied and is reported; the patch's other
    /// fields still are.
    ///
    /// # Errors
    /// `MissionError::ProgressOutOfRange` when `progress > 100`.
    pub fn patch(&mut self, patch: &MissionPatch) -> Result<(), MissionError> {
        let mut result = Ok(());

        if let Some(phase) = &patch.phase {
            self.state.phase.clone_from(phase);
        }
        if let Some(progress) = patch.progress {
            if progress <= MAX_PROGRESS {
                self.state.progress = progress;
            } else {
                self.inconsistencies += 1;
                result = Err(MissionError::ProgressOutOfRange { value: progress });
            }
        }
        if let Some(parity) = &patch.parity {
            self.state.parity.clone_from(parity);
        }
        if let Some(count) = patch.needs_confirmation {
            self.state.needs_confirmation = count;
        }
        if let Some(count) = patch.jobs_running {
            self.state.jobs_running = count;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_matches_opening() {
        let state = MissionState::initial();
        assert_eq!(state.phase, "CPQ Reality");
        assert_eq!(state.progress, 0);
        assert_eq!(state.parity, "—");
        assert_eq!(state.needs_confirmation, 0);
        assert_eq!(state.jobs_running, 0);
    }

    #[test]
    fn patch_preserves_unmentioned_fields() {
        let mut mission = MissionAggregator::new();
        mission
            .patch(&MissionPatch::new().phase("Discover").progress(5))
            .unwrap();
        mission.patch(&MissionPatch::new().jobs_running(1)).unwrap();

        let state = mission.state();
        assert_eq!(state.phase, "Discover");
        assert_eq!(state.progress, 5);
        assert_eq!(state.jobs_running, 1);
        assert_eq!(state.parity, "—");
    }

    #[test]
    fn out_of_range_progress_is_reported_not_applied() {
        let mut mission = MissionAggregator::new();
        mission.patch(&MissionPatch::new().progress(40)).unwrap();

        let err = mission
            .patch(&MissionPatch::new().progress(130).parity("Running"))
            .unwrap_err();
        assert_eq!(err, MissionError::ProgressOutOfRange { value: 130 });
        assert_eq!(mission.state().progress, 40);
        assert_eq!(mission.state().parity, "Running");
        assert_eq!(mission.inconsistencies(), 1);
    }

    #[test]
    fn reset_patch_restores_initial() {
        let mut mission = MissionAggregator::new();
        mission
            .patch(&MissionPatch::new().phase("Run").progress(90).jobs_running(1))
            .unwrap();
        mission
            .patch(&MissionPatch::reset_to(MissionState::initial()))
            .unwrap();
        assert_eq!(mission.state(), &MissionState::initial());
    }

    #[test]
    fn empty_patch() {
        assert!(MissionPatch::new().is_empty());
        assert!(!MissionPatch::new().progress(1).is_empty());
    }
}
