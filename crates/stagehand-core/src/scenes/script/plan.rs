//! Plan phase: phase 1 proposal and stakeholder check (`S6_80`, `S7`)

use super::{strings, PLANNER_AGENT, TOAST};
use crate::canvas::{CanvasPayload, CanvasState, PhaseScopeData, ScopeItem, StakeholderData, TeamRow};
use crate::error::RecipeError;
use crate::mission::MissionPatch;
use crate::scenes::{SceneRecipe, SceneRegistry, TaskPlan};
use crate::tasks::{AgentTask, StepStatus, TaskPatch};
use crate::types::{ActionButton, Utterance};

const FULL_CYCLE: [&str; 3] = ["Translate", "Verify", "Run"];

pub(super) fn register(registry: &mut SceneRegistry) -> Result<(), RecipeError> {
    registry.register("S6_80", phase_proposal())?;
    registry.register("S7", stakeholder_check())?;
    Ok(())
}

fn proposal_canvas(title: &str, coverage: &str, included: Vec<ScopeItem>) -> CanvasState {
    CanvasState::new(
        title,
        CanvasPayload::PhaseScopeProposal(PhaseScopeData {
            coverage: coverage.to_string(),
            included,
        }),
    )
}

fn item(name: &str, usage: &str, steps: &[&str]) -> ScopeItem {
    ScopeItem {
        item: name.to_string(),
        usage: usage.to_string(),
        steps: strings(steps),
    }
}

fn phase_proposal() -> SceneRecipe {
    let task = AgentTask::new("task_plan_01", "Analyzing Dependencies", "Tracing references...")
        .step("1", "Cluster Top 20 Artifacts", StepStatus::Running)
        .step("2", "Calculate Dependency Surface", StepStatus::Pending)
        .step("3", "Project Coverage %", StepStatus::Pending);

    let proposal = proposal_canvas(
        "Phase 1 Scope Proposal (Usage-first)",
        "78% of quote volume",
        vec![
            item("Volume Discount (Seat Tiers)", "62% of quotes", &FULL_CYCLE),
            item("Discount > 15% Approval", "224 triggers", &FULL_CYCLE),
            item("Top 6 bundles by usage", "covers 41% of quotes", &FULL_CYCLE),
            item("Enterprise Quote PDF v3", "12% of quotes", &FULL_CYCLE),
            item("Data fix: Region__c completion", "6% of lines missing", &["Apply", "Verify"]),
        ],
    );

    SceneRecipe::new()
        .say(
            Utterance::assistant(
                PLANNER_AGENT,
                "Here’s a Phase 1 proposal covering ~78% of quote volume. It focuses on top pricing + approvals + most-used bundles + primary document output.",
            )
            .with_actions(vec![
                ActionButton::navigate("Approve Phase 1 scope", "approve_scope", "S7"),
                ActionButton::effect("Edit scope", "edit_scope", TOAST),
                ActionButton::effect("Explain why", "explain_scope", TOAST),
            ]),
        )
        .canvas(proposal_canvas(
            "Phase 1 Scope Proposal (Generating...)",
            "Calculating...",
            Vec::new(),
        ))
        .task(
            TaskPlan::new(task)
                .update(
                    1_500,
                    TaskPatch::new()
                        .status("Projecting coverage...")
                        .step("1", StepStatus::Completed)
                        .step("2", StepStatus::Running),
                )
                .update_with_canvas(3_500, TaskPatch::complete("Complete"), proposal),
        )
}

fn stakeholder_check() -> SceneRecipe {
    let teams = [
        ("Sales Ops", "Maya Cohen", "48 catalog edits"),
        ("Finance (Billing)", "Lina Park", "96 invoice-related touches"),
        ("Finance (RevRec)", "Jordan Wu", "Revenue schedule reviews"),
        ("IT/Admin", "Tom Reyes", "Deployments & integrations"),
    ]
    .into_iter()
    .map(|(team, top_user, activity)| TeamRow {
        team: team.to_string(),
        top_user: top_user.to_string(),
        activity: activity.to_string(),
    })
    .collect();

    SceneRecipe::new()
        .mission(MissionPatch::new().progress(38))
        .say(
            Utterance::assistant(
                PLANNER_AGENT,
                "Before we start, I found 3 stakeholders who own these rules. Should we notify them?",
            )
            .with_actions(vec![
                ActionButton::navigate("Notify & Continue", "notify", "S8"),
                ActionButton::navigate("Skip notification", "skip_notify", "S8"),
            ]),
        )
        .canvas(CanvasState::new(
            "Stakeholder Check",
            CanvasPayload::StakeholderConfirm(StakeholderData { teams }),
        ))
}
