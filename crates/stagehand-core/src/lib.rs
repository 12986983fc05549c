//! Stagehand Core - scripted migration walkthrough
//!
//! Plays a fixed, branching conversation between a consultant and a team of
//! migration agents:
//! - Scenes: declarative recipes (messages, canvas, mission, background task)
//! - Sequencing: typing indicators and deliveries on a virtual timeline
//! - Task choreography: step progress and auto-advance driven by the clock
//! - Action routing: buttons, configured routes and expert-desk tools
//!
//! Everything is driven by a [`Clock`](stagehand_kernel::Clock): a manual clock in
//! tests, the tokio clock for playback.
//!
//! # Example
//!
//! ```rust
//! use stagehand_core::prelude::*;
//! use std::sync::Arc;
//!
//! let clock = ManualClock::new();
//! let mut orchestrator =
//!     Orchestrator::with_script(OrchestratorConfig::default(), Arc::new(clock.clone())).unwrap();
//!
//! clock.advance(2_170);
//! orchestrator.pump();
//! assert_eq!(orchestrator.snapshot().messages.len(), 1);
//!
//! let outcome = orchestrator.dispatch_action("start_scan", None);
//! assert!(matches!(outcome, ActionOutcome::Navigated { .. }));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod actions;
pub mod canvas;
pub mod config;
pub mod error;
pub mod expert;
pub mod mission;
pub mod orchestrator;
pub mod scenes;
pub mod sequencer;
pub mod store;
pub mod tasks;
pub mod types;

// Testing
pub mod test_harness;

// Re-exports for convenience
pub use actions::{ActionOutcome, ActionRecord, ActionRouter, Resolution, RouteSource};
pub use canvas::{CanvasPayload, CanvasState, CANVAS_TYPES};
pub use config::{OrchestratorConfig, ScriptedReply, TimingConfig, TypingProfile};
pub use error::{ConfigError, MissionError, RecipeError, StageError, TaskError};
pub use expert::{ExpertAction, ExpertOutcome, ExpertOutput};
pub use mission::{MissionPatch, MissionState};
pub use orchestrator::Orchestrator;
pub use scenes::{canonical_registry, SceneRecipe, SceneRegistry, TaskPlan};
pub use store::{Effect, Snapshot};
pub use tasks::{AgentTask, StepStatus, TaskPatch};
pub use types::{ActionButton, AgentRole, ChatMessage, MessageId, SceneId, Utterance};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a walkthrough
    pub use crate::{
        ActionOutcome, ChatMessage, ExpertAction, ExpertOutcome, Orchestrator,
        OrchestratorConfig, SceneId, Snapshot, StageError,
    };
    pub use stagehand_kernel::{Clock, ManualClock, Millis, TokioClock};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
