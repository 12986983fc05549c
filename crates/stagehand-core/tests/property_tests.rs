//! Property tests: invariants hold under any interleaving of requests and time

use proptest::prelude::*;
use stagehand_core::test_harness::InvariantMonitor;
use stagehand_core::{canonical_registry, ExpertAction, Orchestrator};
use stagehand_kernel::ManualClock;
use stagehand_test_utils::*;

#[derive(Debug, Clone)]
enum Op {
    Wait(u64),
    Press(usize),
    Enter(usize),
    Say(String),
    Expert(usize),
    Unknown(String),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u64..4_000).prop_map(Op::Wait),
        3 => (0usize..4).prop_map(Op::Press),
        1 => (0usize..16).prop_map(Op::Enter),
        1 => "[a-z ]{1,24}".prop_map(Op::Say),
        1 => (0usize..ExpertAction::ALL.len()).prop_map(Op::Expert),
        1 => "[a-z_]{1,12}".prop_map(Op::Unknown),
    ]
}

fn apply(orchestrator: &mut Orchestrator, clock: &ManualClock, scenes: &[String], op: &Op) {
    match op {
        Op::Wait(ms) => {
            advance(orchestrator, clock, *ms);
        }
        Op::Press(index) => {
            let actions = visible_actions(&orchestrator.snapshot());
            if let Some(action) = actions.get(index % actions.len().max(1)) {
                orchestrator.dispatch_action(action, None);
            }
        }
        Op::Enter(index) => {
            let _ = orchestrator.advance_to_scene(&scenes[index % scenes.len()]);
        }
        Op::Say(text) => {
            orchestrator.submit_user_message(text);
        }
        Op::Expert(index) => {
            orchestrator.handle_expert_action(ExpertAction::ALL[*index]);
        }
        Op::Unknown(action) => {
            orchestrator.dispatch_action(&format!("x_{action}"), None);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_for_any_session(ops in prop::collection::vec(op(), 1..60)) {
        let scenes: Vec<String> = canonical_registry()
            .unwrap()
            .ids()
            .map(|id| id.to_string())
            .collect();
        let (mut orchestrator, clock) = setup_orchestrator();
        let mut monitor = InvariantMonitor::new();
        monitor.observe(&orchestrator);

        for op in &ops {
            apply(&mut orchestrator, &clock, &scenes, op);
            let violations = monitor.observe(&orchestrator);
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
        }

        settle(&mut orchestrator, &clock);
        prop_assert!(orchestrator.is_idle());
        prop_assert!(!orchestrator.snapshot().is_typing);
        prop_assert!(monitor.observe(&orchestrator).is_empty());
    }

    #[test]
    fn user_messages_each_get_one_reply(count in 1usize..6, gap in 0u64..3_000) {
        let (mut orchestrator, clock) = setup_settled();
        let before = orchestrator.snapshot().messages.len();

        for i in 0..count {
            orchestrator.submit_user_message(&format!("question {i}"));
            advance(&mut orchestrator, &clock, gap);
        }
        let snapshot = settle(&mut orchestrator, &clock);

        prop_assert_eq!(snapshot.messages.len(), before + 2 * count);
        prop_assert_eq!(messages_from(&snapshot, "Gemini 3").len(), count);
        for pair in snapshot.messages.windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn wait_granularity_does_not_change_the_outcome(steps in prop::collection::vec(1u64..700, 1..40)) {
        let (mut stepped, stepped_clock) = setup_orchestrator();
        stepped.advance_to_scene("S2").unwrap();
        let total: u64 = steps.iter().sum();
        for step in &steps {
            advance(&mut stepped, &stepped_clock, *step);
        }

        let (mut jumped, jumped_clock) = setup_orchestrator();
        jumped.advance_to_scene("S2").unwrap();
        advance(&mut jumped, &jumped_clock, total);

        prop_assert_eq!(stepped.snapshot(), jumped.snapshot());
    }
}
