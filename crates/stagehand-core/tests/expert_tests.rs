//! Expert desk: busy gating, reply timing and recent outputs

use pretty_assertions::assert_eq;
use stagehand_core::expert::EXPERT_AGENT;
use stagehand_core::{ExpertAction, ExpertOutcome};
use stagehand_test_utils::*;

#[test]
fn tool_is_busy_while_an_agent_types() {
    let (mut orchestrator, clock) = setup_orchestrator();
    advance_to(&mut orchestrator, &clock, 150);
    assert!(orchestrator.snapshot().is_typing);

    assert_eq!(
        orchestrator.handle_expert_action(ExpertAction::GenerateAgenda),
        ExpertOutcome::Busy
    );
    assert!(orchestrator.expert_outputs().is_empty());
    assert_eq!(orchestrator.timeline_stats().scheduled, 4);
}

#[test]
fn request_between_messages_waits_for_the_scene_chain() {
    let (mut orchestrator, clock) = setup_orchestrator();
    advance_to(&mut orchestrator, &clock, 3_000);
    assert!(!orchestrator.snapshot().is_typing);

    // The opening chain lands its last message at 6075.
    let outcome = orchestrator.handle_expert_action(ExpertAction::GenerateAgenda);
    assert_eq!(outcome, ExpertOutcome::Queued { lands_at: 6_075 + 1_560 });

    let snapshot = settle(&mut orchestrator, &clock);
    let replies = messages_from(&snapshot, EXPERT_AGENT);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].timestamp, 7_635);
    assert!(replies[0].content.starts_with("I've drafted a 60-min"));
    assert_eq!(snapshot.messages.len(), 3);
}

#[test]
fn outputs_are_listed_newest_first() {
    let (mut orchestrator, clock) = setup_settled();

    let first = orchestrator.handle_expert_action(ExpertAction::GenerateRecap);
    let ExpertOutcome::Queued { lands_at } = first else {
        panic!("desk should be free, got {first:?}");
    };
    assert!(orchestrator.expert_outputs().is_empty());
    advance_to(&mut orchestrator, &clock, lands_at);
    assert_eq!(orchestrator.expert_outputs().len(), 1);

    orchestrator.handle_expert_action(ExpertAction::AnalyzeChanges);
    settle(&mut orchestrator, &clock);

    let outputs = orchestrator.expert_outputs();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].id, "out-2");
    assert_eq!(outputs[0].title, "Change analysis");
    assert_eq!(outputs[1].id, "out-1");
    assert_eq!(outputs[1].title, "Client recap email");
    assert_eq!(outputs[1].time, "00:07");
}

#[test]
fn expert_reply_survives_navigation() {
    let (mut orchestrator, clock) = setup_settled();
    orchestrator.handle_expert_action(ExpertAction::GenerateChecklist);
    orchestrator.advance_to_scene("S5").unwrap();

    let snapshot = settle(&mut orchestrator, &clock);
    assert_eq!(messages_from(&snapshot, EXPERT_AGENT).len(), 1);
    assert_eq!(orchestrator.expert_outputs().len(), 1);
    assert_eq!(scene_of(&snapshot), "S5");
}

#[test]
fn request_behind_a_superseded_chain_moves_forward() {
    let (mut orchestrator, clock) = setup_settled();
    let t = now(&clock);
    orchestrator.advance_to_scene("S2").unwrap();

    let outcome = orchestrator.handle_expert_action(ExpertAction::GenerateAgenda);
    assert_eq!(outcome, ExpertOutcome::Queued { lands_at: t + 5_025 + 1_560 });

    advance_to(&mut orchestrator, &clock, t + 50);
    orchestrator.advance_to_scene("S5").unwrap();

    let snapshot = settle(&mut orchestrator, &clock);
    let replies = messages_from(&snapshot, EXPERT_AGENT);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].timestamp, t + 1_560);

    let outputs = orchestrator.expert_outputs();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].time, "00:07");

    // The dependency map leads in only after the deliverable lands.
    let map = find_message(&snapshot, "I've mapped the dependencies").unwrap();
    assert_eq!(map.timestamp, t + 1_560 + 100 + 2_475);
}

#[test]
fn desk_requests_do_not_touch_the_walkthrough() {
    let (mut orchestrator, clock) = setup_settled();
    let before = orchestrator.snapshot();

    orchestrator.handle_expert_action(ExpertAction::GenerateTestPlan);
    let snapshot = settle(&mut orchestrator, &clock);

    assert_eq!(snapshot.mission, before.mission);
    assert_eq!(snapshot.canvas, before.canvas);
    assert_eq!(snapshot.task, before.task);
    assert_eq!(snapshot.scene_id, before.scene_id);
}
