//! Expert desk
//!
//! Consultant tools that produce client deliverables. Each tool queues a reply from
//! the expert assistant; when the reply lands the deliverable is listed in the
//! recent outputs, newest first. Tools are unavailable while an agent is typing.

use serde::{Deserialize, Serialize};
use stagehand_kernel::Millis;

/// Agent that answers expert-desk requests
pub const EXPERT_AGENT: &str = "Expert Assistant";

/// One consultant tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertAction {
    GenerateAgenda,
    GenerateTestPlan,
    GenerateRecap,
    GenerateChecklist,
    AnalyzeChanges,
}

impl ExpertAction {
    /// Every tool, in desk order
    pub const ALL: [Self; 5] = [
        Self::GenerateAgenda,
        Self::GenerateTestPlan,
        Self::GenerateRecap,
        Self::GenerateChecklist,
        Self::AnalyzeChanges,
    ];

    /// Wire id of the tool
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::GenerateAgenda => "generate_agenda",
            Self::GenerateTestPlan => "generate_test_plan",
            Self::GenerateRecap => "generate_recap",
            Self::GenerateChecklist => "generate_checklist",
            Self::AnalyzeChanges => "analyze_changes",
        }
    }

    /// Parse a wire id
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }

    /// Title of the produced deliverable
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::GenerateAgenda => "Workshop agenda",
            Self::GenerateTestPlan => "Parity test plan",
            Self::GenerateRecap => "Client recap email",
            Self::GenerateChecklist => "Execution checklist",
            Self::AnalyzeChanges => "Change analysis",
        }
    }

    /// What the expert assistant says when the deliverable is ready
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            Self::GenerateAgenda => {
                "I've drafted a 60-min expert-guided session plan based on the top used flows and identified bottlenecks."
            }
            Self::GenerateTestPlan => {
                "I've created CPQ vs RCA parity tests for the most-used quote scenarios found in the scan."
            }
            Self::GenerateRecap => {
                "I've summarized decisions, risks, and next actions since the last scan for the executive sponsor."
            }
            Self::GenerateChecklist => {
                "I've turned the migration blueprint into run-ready tasks with owners and sequencing."
            }
            Self::AnalyzeChanges => {
                "I've checked for new rules, catalog edits, and usage shifts since the last snapshot."
            }
        }
    }
}

impl std::fmt::Display for ExpertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A generated deliverable in the recent-outputs list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertOutput {
    pub id: String,
    pub title: String,
    /// Display time, `mm:ss` of virtual time
    pub time: String,
}

impl ExpertOutput {
    /// Output for `action`, produced at `at`
    #[must_use]
    pub fn new(sequence: u64, action: ExpertAction, at: Millis) -> Self {
        let seconds = at / 1_000;
        Self {
            id: format!("out-{sequence}"),
            title: action.title().to_string(),
            time: format!("{:02}:{:02}", seconds / 60, seconds % 60),
        }
    }
}

/// Result of pressing an expert tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpertOutcome {
    /// Reply scheduled; lands at the given virtual time unless a scene change re-plans it
    Queued { lands_at: Millis },
    /// An agent is typing; the tool is disabled
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_for_every_tool() {
        for action in ExpertAction::ALL {
            assert_eq!(ExpertAction::from_id(action.id()), Some(action));
        }
        assert_eq!(ExpertAction::from_id("generate_slides"), None);
    }

    #[test]
    fn output_time_formats_virtual_clock() {
        let output = ExpertOutput::new(3, ExpertAction::GenerateRecap, 125_400);
        assert_eq!(output.id, "out-3");
        assert_eq!(output.title, "Client recap email");
        assert_eq!(output.time, "02:05");
    }

    #[test]
    fn serde_uses_wire_ids() {
        let json = serde_json::to_value(ExpertAction::AnalyzeChanges).unwrap();
        assert_eq!(json, "analyze_changes");
    }
}
