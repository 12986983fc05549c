//! Walkthrough invariants
//!
//! Checked against consecutive snapshots of one orchestrator.

use crate::canvas::{CanvasState, CANVAS_TYPES};
use crate::mission::MAX_PROGRESS;
use crate::orchestrator::Orchestrator;
use crate::store::Snapshot;

/// Types of invariant checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantCheck {
    ProgressInRange,
    HistoryIsAppendOnly,
    MessageIdsIncrease,
    TimestampsNeverDecrease,
    TypingLabelMatchesFlag,
    CanvasIsKnownContract,
    StepsNeverRegress,
}

/// A specific invariant violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub check: InvariantCheck,
    pub details: String,
}

impl InvariantViolation {
    fn new(check: InvariantCheck, details: impl Into<String>) -> Self {
        Self {
            check,
            details: details.into(),
        }
    }
}

/// Checks every observed snapshot against the one before it
#[derive(Debug, Clone, Default)]
pub struct InvariantMonitor {
    previous: Option<Snapshot>,
    previous_epoch: u64,
    observations: u64,
}

impl InvariantMonitor {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots checked so far
    #[inline]
    #[must_use]
    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// Check the orchestrator's current state
    pub fn observe(&mut self, orchestrator: &Orchestrator) -> Vec<InvariantViolation> {
        let current = orchestrator.snapshot();
        let epoch = orchestrator.task_epoch();

        let mut violations = check_snapshot(&current);
        if let Some(previous) = &self.previous {
            violations.extend(check_transition(
                previous,
                &current,
                epoch == self.previous_epoch,
            ));
        }

        self.previous = Some(current);
        self.previous_epoch = epoch;
        self.observations += 1;
        violations
    }
}

/// Checks that hold for any single snapshot
#[must_use]
pub fn check_snapshot(snapshot: &Snapshot) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if snapshot.mission.progress > MAX_PROGRESS {
        violations.push(InvariantViolation::new(
            InvariantCheck::ProgressInRange,
            format!("progress {}", snapshot.mission.progress),
        ));
    }

    if snapshot.is_typing != snapshot.typing_label.is_some() {
        violations.push(InvariantViolation::new(
            InvariantCheck::TypingLabelMatchesFlag,
            format!(
                "is_typing={} label={:?}",
                snapshot.is_typing, snapshot.typing_label
            ),
        ));
    }

    for pair in snapshot.messages.windows(2) {
        if pair[1].id <= pair[0].id {
            violations.push(InvariantViolation::new(
                InvariantCheck::MessageIdsIncrease,
                format!("{} follows {}", pair[1].id, pair[0].id),
            ));
        }
        if pair[1].timestamp < pair[0].timestamp {
            violations.push(InvariantViolation::new(
                InvariantCheck::TimestampsNeverDecrease,
                format!("{} at {} before {}", pair[1].id, pair[1].timestamp, pair[0].timestamp),
            ));
        }
    }

    if let Some(canvas) = &snapshot.canvas {
        let decoded = serde_json::to_value(canvas)
            .ok()
            .and_then(|value| CanvasState::from_json(&value));
        let known = CANVAS_TYPES.contains(&canvas.type_tag());
        if !known || decoded.as_ref() != Some(canvas) {
            violations.push(InvariantViolation::new(
                InvariantCheck::CanvasIsKnownContract,
                format!("canvas {} does not decode to itself", canvas.type_tag()),
            ));
        }
    }

    violations
}

/// Checks between two consecutive snapshots
#[must_use]
pub fn check_transition(
    previous: &Snapshot,
    current: &Snapshot,
    same_task: bool,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let kept = current.messages.len() >= previous.messages.len()
        && current.messages[..previous.messages.len()] == previous.messages[..];
    if !kept {
        violations.push(InvariantViolation::new(
            InvariantCheck::HistoryIsAppendOnly,
            format!(
                "history went from {} to {} messages",
                previous.messages.len(),
                current.messages.len()
            ),
        ));
    }

    if same_task {
        if let (Some(before), Some(after)) = (&previous.task, &current.task) {
            for (old, new) in before.steps.iter().zip(&after.steps) {
                if new.status < old.status {
                    violations.push(InvariantViolation::new(
                        InvariantCheck::StepsNeverRegress,
                        format!(
                            "task {} step {}: {:?} -> {:?}",
                            after.id, new.id, old.status, new.status
                        ),
                    ));
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Utterance;

    #[test]
    fn empty_snapshot_is_clean() {
        assert!(check_snapshot(&Snapshot::empty()).is_empty());
    }

    #[test]
    fn typing_flag_without_label_is_flagged() {
        let mut snapshot = Snapshot::empty();
        snapshot.is_typing = true;
        let violations = check_snapshot(&snapshot);
        assert_eq!(violations[0].check, InvariantCheck::TypingLabelMatchesFlag);
    }

    #[test]
    fn shrinking_history_is_flagged() {
        let mut before = Snapshot::empty();
        before
            .messages
            .push(Utterance::system("A", "hi").into_message(crate::types::MessageId(1), 0));
        let after = Snapshot::empty();
        let violations = check_transition(&before, &after, true);
        assert_eq!(violations[0].check, InvariantCheck::HistoryIsAppendOnly);
    }
}
