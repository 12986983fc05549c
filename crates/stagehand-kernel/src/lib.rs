//! Stagehand Kernel
//!
//! Timing primitives for the walkthrough orchestrator:
//! 1. **Clock**: where "now" comes from (manual for tests, tokio for playback)
//! 2. **Timeline**: ordered, generation-tagged queue of scheduled effects
//! 3. **Driver**: async loop that sleeps between due times and pumps a timeline owner
//!
//! Scheduled work is plain data. The timeline never runs callbacks itself; its owner
//! pops due entries and applies them, so a single writer mutates state.
//!
//! # Quick Start
//!
//! ```rust
//! use stagehand_kernel::prelude::*;
//!
//! let mut timeline: Timeline<&'static str> = Timeline::new();
//! let generation = timeline.begin_generation();
//! timeline.schedule_in(100, Owner::Scene(generation), "hello");
//!
//! assert!(timeline.pop_due(50).is_none());
//! let entry = timeline.pop_due(100).unwrap();
//! assert_eq!(entry.effect, "hello");
//! ```

pub mod clock;
pub mod driver;
pub mod timeline;

pub use clock::{Clock, ManualClock, Millis, TokioClock};
pub use driver::{drive, DriveSummary, Pump};
pub use timeline::{Entry, Generation, Owner, Timeline, TimelineStats};

/// Common imports for timeline owners
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, Millis, TokioClock};
    pub use crate::driver::{drive, DriveSummary, Pump};
    pub use crate::timeline::{Entry, Generation, Owner, Timeline, TimelineStats};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
