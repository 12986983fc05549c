//! Configuration loading and its effect on timing

use pretty_assertions::assert_eq;
use stagehand_core::{ActionOutcome, ConfigError, OrchestratorConfig, StageError, TimingConfig};
use stagehand_test_utils::*;
use std::io::Write;

const FAST: &str = r#"
start_scene = "S1"

[timing]
lead_in_ms = 10
inter_message_ms = 100
user_reply_delay_ms = 300

[timing.typing]
per_char_ms = 1
min_ms = 50
max_ms = 50

[reply]
agent = "Helper"
content = "Noted."
reasoning = []

[action_routes]
skip_ahead = "S14"
"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loaded_timing_drives_delivery() {
    let file = write_config(FAST);
    let config = OrchestratorConfig::load(file.path()).unwrap();
    assert_eq!(config.start_scene.as_str(), "S1");
    assert_eq!(config.timing.lead_in_ms, 10);
    // Listed routes are merged over the defaults.
    assert_eq!(config.action_routes.len(), 3);
    assert_eq!(config.action_routes["run_scan"].as_str(), "S2");

    let (mut orchestrator, clock) = setup_with_config(config);
    let snapshot = settle(&mut orchestrator, &clock);
    let stamps: Vec<_> = snapshot.messages.iter().map(|m| m.timestamp).collect();
    assert_eq!(stamps, vec![60, 210]);

    orchestrator.submit_user_message("hi");
    let snapshot = settle(&mut orchestrator, &clock);
    let reply = snapshot.last_message().unwrap();
    assert_eq!(reply.agent_name.as_deref(), Some("Helper"));
    assert_eq!(reply.content, "Noted.");
    assert_eq!(reply.timestamp, 510);
}

#[test]
fn configured_routes_keep_the_scan_route() {
    let file = write_config(FAST);
    let config = OrchestratorConfig::load(file.path()).unwrap();
    let (mut orchestrator, clock) = setup_with_config(config);
    settle(&mut orchestrator, &clock);

    let outcome = orchestrator.dispatch_action("run_scan", None);
    assert!(matches!(outcome, ActionOutcome::Navigated { ref scene, .. } if scene.as_str() == "S2"));
    let outcome = orchestrator.dispatch_action("skip_ahead", None);
    assert!(matches!(outcome, ActionOutcome::Navigated { ref scene, .. } if scene.as_str() == "S14"));
}

#[test]
fn extreme_timing_saturates_instead_of_overflowing() {
    let config =
        OrchestratorConfig::from_toml_str("[timing]\ninter_message_ms = 9223372036854775807\n")
            .unwrap();
    let (mut orchestrator, clock) = setup_with_config(config);
    let snapshot = settle(&mut orchestrator, &clock);
    let stamps: Vec<_> = snapshot.messages.iter().map(|m| m.timestamp).collect();
    assert_eq!(stamps[0], 2_170);
    assert_eq!(stamps[1], 2_170 + 9_223_372_036_854_775_807 + 1_905);

    let config = OrchestratorConfig::new().with_timing(TimingConfig {
        lead_in_ms: u64::MAX,
        ..TimingConfig::default()
    });
    let (mut orchestrator, clock) = setup_with_config(config);
    orchestrator.submit_user_message("still there?");
    let snapshot = settle(&mut orchestrator, &clock);
    assert_eq!(snapshot.messages.len(), 4);
    assert_eq!(snapshot.messages[0].content, "still there?");
    assert!(snapshot.messages.iter().skip(1).all(|m| m.timestamp == u64::MAX));
}

#[test]
fn omitted_keys_keep_defaults() {
    let config = OrchestratorConfig::from_toml_str("[timing]\nlead_in_ms = 250\n").unwrap();
    assert_eq!(config.timing.lead_in_ms, 250);
    assert_eq!(config.timing.inter_message_ms, 2_000);
    assert_eq!(config.start_scene.as_str(), "S0");
    assert_eq!(config.reply.agent, "Gemini 3");
    assert_eq!(config.action_routes.len(), 2);
}

#[test]
fn inconsistent_typing_bounds_are_rejected() {
    let err = OrchestratorConfig::from_toml_str("[timing.typing]\nmin_ms = 3000\nmax_ms = 100\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
}

#[test]
fn malformed_and_missing_files_are_reported() {
    let file = write_config("start_scene = [");
    assert!(matches!(
        OrchestratorConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(
        OrchestratorConfig::load(&missing),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn unknown_start_scene_fails_construction() {
    let config = OrchestratorConfig::new().with_start_scene("S404");
    let clock = stagehand_kernel::ManualClock::new();
    let err = stagehand_core::Orchestrator::with_script(config, std::sync::Arc::new(clock)).unwrap_err();
    assert!(matches!(err, StageError::UnknownScene(ref id) if id.as_str() == "S404"));
}
