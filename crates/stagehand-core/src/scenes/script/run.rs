//! Run phase: QA deployment and summary (`S14`, `S15`)

use super::{MIGRATION_AGENT, RUNNER_AGENT, TOAST};
use crate::canvas::{CanvasPayload, CanvasState, RunSummaryData, RunTimelineData};
use crate::error::RecipeError;
use crate::mission::MissionPatch;
use crate::scenes::{SceneRecipe, SceneRegistry, TaskPlan};
use crate::tasks::{AgentTask, StepStatus, TaskPatch};
use crate::types::{ActionButton, Utterance};

pub(super) fn register(registry: &mut SceneRegistry) -> Result<(), RecipeError> {
    registry.register("S14", qa_run())?;
    registry.register("S15", qa_summary())?;
    Ok(())
}

fn qa_run() -> SceneRecipe {
    let task = AgentTask::new("task_qa_01", "Deploying Phase 1 to QA", "Starting deployment...")
        .step("1", "Snapshot QA Environment", StepStatus::Running)
        .step("2", "Deploy Pricing Procedures", StepStatus::Pending)
        .step("3", "Execute Test Suite", StepStatus::Pending);

    SceneRecipe::new()
        .mission(MissionPatch::new().phase("Run").progress(90).jobs_running(1))
        .say(Utterance::system(
            MIGRATION_AGENT,
            "Parity verified. Runner Agent, please deploy to QA environment and execute the suite.",
        ))
        .say(
            Utterance::assistant(
                RUNNER_AGENT,
                "Running Phase 1 in QA now. I’ll stream each step, show counts, and create a rollback checkpoint.",
            )
            .with_reasoning(&[
                "Initializing deployment pipeline...",
                "Snapshotting QA environment for rollback...",
                "Pushing Pricing Procedure 'Volume_Discount_v1'...",
            ]),
        )
        .canvas(CanvasState::new(
            "AI Migration Run — QA",
            CanvasPayload::RunTimeline(RunTimelineData {
                current_step: "Deploy to QA".into(),
            }),
        ))
        .task(
            TaskPlan::new(task)
                .update(
                    2_500,
                    TaskPatch::new()
                        .status("Deploying logic...")
                        .step("1", StepStatus::Completed)
                        .step("2", StepStatus::Completed)
                        .step("3", StepStatus::Running),
                )
                .update(5_000, TaskPatch::complete("Complete"))
                .advance(5_000, "S15"),
        )
}

fn qa_summary() -> SceneRecipe {
    SceneRecipe::new()
        .mission(
            MissionPatch::new()
                .progress(100)
                .jobs_running(0)
                .needs_confirmation(1),
        )
        .say(
            Utterance::assistant(
                RUNNER_AGENT,
                "QA run complete. Phase 1 pricing is deployed and parity-gated. I found 2 optional field mappings I can suggest to improve completeness. Next recommended item: Discount > 15% Approval translation.",
            )
            .with_actions(vec![ActionButton::effect("Finish Demo", "finish", TOAST)]),
        )
        .canvas(CanvasState::new(
            "QA Run Summary — Phase 1",
            CanvasPayload::RunSummary(RunSummaryData::Status {
                status: "SUCCESS".into(),
            }),
        ))
}
