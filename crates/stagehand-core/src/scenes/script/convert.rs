//! Convert phase: logic translation and the replay suite (`S8`, `S9`)

use super::{strings, MIGRATION_AGENT, PROVER_AGENT, TOAST, TRANSLATOR_AGENT};
use crate::canvas::{
    CanvasPayload, CanvasState, Confirmation, CpqSide, RcaSide, ReplayProgressData,
    TestPlanPreview, TranslationData,
};
use crate::error::RecipeError;
use crate::mission::MissionPatch;
use crate::scenes::{SceneRecipe, SceneRegistry, TaskPlan};
use crate::tasks::{AgentTask, StepStatus, TaskPatch};
use crate::types::{ActionButton, Utterance};
use indexmap::IndexMap;

pub(super) fn register(registry: &mut SceneRegistry) -> Result<(), RecipeError> {
    registry.register("S8", translation())?;
    registry.register("S9", replay_suite())?;
    Ok(())
}

fn translation_canvas(title: &str, data: TranslationData) -> CanvasState {
    CanvasState::new(title, CanvasPayload::TranslationCanvas(Box::new(data)))
}

fn placeholder() -> CanvasState {
    translation_canvas(
        "Translation — Generating...",
        TranslationData {
            cpq_side: CpqSide {
                name: "Loading...".into(),
                inputs: Vec::new(),
                plain_english: Vec::new(),
                evidence: Vec::new(),
            },
            rca_side: RcaSide {
                construct: "Generating...".into(),
                blocks: Vec::new(),
            },
            confirmations: Vec::new(),
            test_plan_preview: TestPlanPreview {
                replay_sets: Vec::new(),
            },
        },
    )
}

fn volume_discount() -> CanvasState {
    let fields: IndexMap<String, String> = [
        ("Tier 1 Min", "10"),
        ("Tier 1 %", "5.0"),
        ("Tier 2 Min", "50"),
        ("Tier 2 %", "10.0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    translation_canvas(
        "Translation — Volume Discount (Seat Tiers)",
        TranslationData {
            cpq_side: CpqSide {
                name: "Volume Discount Schedule".into(),
                inputs: strings(&["SBQQ__Quantity__c", "SBQQ__ListPrice__c", "User.Segment__c"]),
                plain_english: strings(&[
                    "If Quantity is between 10-49, apply 5% discount.",
                    "If Quantity is 50+, apply 10% discount.",
                    "Override: If User Segment is 'Partner', add extra 2%.",
                ]),
                evidence: strings(&[
                    "Triggered on 62% of quotes",
                    "98% matched standard tiers",
                    "2% fell into partner override",
                ]),
            },
            rca_side: RcaSide {
                construct: "Pricing Procedure".into(),
                blocks: strings(&[
                    "Load List Price",
                    "Lookup Volume Discount Table",
                    "Calc Tier Adjustment",
                    "Check Partner Status",
                    "Finalize Net Price",
                ]),
            },
            confirmations: vec![Confirmation {
                question: "Confirm Tiers".into(),
                fields,
            }],
            test_plan_preview: TestPlanPreview {
                replay_sets: strings(&[
                    "Verify base price (Qty < 10)",
                    "Verify Tier 1 (Qty 10-49)",
                    "Verify Tier 2 (Qty 50+)",
                    "Verify Partner Override",
                ]),
            },
        },
    )
}

fn translation() -> SceneRecipe {
    let task = AgentTask::new("task_trans_01", "Translating CPQ Logic", "Parsing Rules...")
        .step("1", "Parse Discount Schedule", StepStatus::Running)
        .step("2", "Map to Pricing Procedure", StepStatus::Pending)
        .step("3", "Generate Test Plan", StepStatus::Pending);

    SceneRecipe::new()
        .mission(MissionPatch::new().phase("Convert").progress(45))
        .say(Utterance::system(
            MIGRATION_AGENT,
            "Planning complete. Logic Translator, please begin conversion for 'Volume Discount'.",
        ))
        .say(
            Utterance::assistant(
                TRANSLATOR_AGENT,
                "I'm translating the 'Volume Discount' bundle now. I’ve converted the Price Rules to RCA Pricing Procedures. Please confirm the tier boundaries.",
            )
            .with_actions(vec![
                ActionButton::navigate("Confirm Logic", "confirm_logic", "S9"),
                ActionButton::effect("View Source Code", "view_source", TOAST),
            ])
            .with_reasoning(&[
                "Analyzing SBQQ__DiscountSchedule__c structure...",
                "Mapping Price Tiers to RCA Decision Matrix...",
                "Detected custom script 'PartnerOverride' -> converting to conditional logic block.",
            ]),
        )
        .canvas(placeholder())
        .task(
            TaskPlan::new(task)
                .update(
                    1_500,
                    TaskPatch::new()
                        .status("Generating Blocks...")
                        .step("1", StepStatus::Completed)
                        .step("2", StepStatus::Running),
                )
                .update_with_canvas(3_500, TaskPatch::complete("Complete"), volume_discount()),
        )
}

fn replay_suite() -> SceneRecipe {
    SceneRecipe::new()
        .mission(
            MissionPatch::new()
                .phase("Verify")
                .progress(55)
                .needs_confirmation(0),
        )
        .say(
            Utterance::assistant(
                PROVER_AGENT,
                "Great. I captured your intent and generated a replay suite of 30 scenarios based on real usage patterns. Ready to run parity replays now?",
            )
            .with_actions(vec![ActionButton::navigate("Run replays", "run_replays", "S10")]),
        )
        .canvas(CanvasState::new(
            "Replay Suite Ready",
            CanvasPayload::ReplayProgress(ReplayProgressData {
                suite_name: "Volume Discount — Phase 1".into(),
                scenarios: 30,
                status: "Ready".into(),
                live_log: None,
            }),
        ))
}
