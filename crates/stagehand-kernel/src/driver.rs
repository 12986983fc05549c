//! Realtime driver
//!
//! Sleeps on the tokio timer until the next due entry and then asks the owner to
//! apply everything due. The owner is told the exact due time to pump to, so the
//! driver never spins when the runtime clock is paused.

use crate::clock::{Clock, Millis, TokioClock};

/// Something that owns a timeline and applies its due effects
pub trait Pump {
    /// Earliest pending due time, if anything is pending
    fn next_due(&self) -> Option<Millis>;

    /// Apply every entry due at or before `now`. Returns the number applied.
    fn pump_to(&mut self, now: Millis) -> usize;
}

/// Outcome of a [`drive`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSummary {
    /// Effects applied
    pub applied: usize,
    /// Virtual time when the run stopped
    pub stopped_at: Millis,
    /// Whether the timeline was empty when the run stopped
    pub idle: bool,
}

/// Drive `pump` in real time until it goes idle or `until` is reached
///
/// `observe` is called after every batch that applied at least one effect.
pub async fn drive<P, F>(
    pump: &mut P,
    clock: &TokioClock,
    until: Option<Millis>,
    mut observe: F,
) -> DriveSummary
where
    P: Pump,
    F: FnMut(&P),
{
    let mut summary = DriveSummary::default();

    loop {
        let Some(due) = pump.next_due() else {
            summary.idle = true;
            break;
        };
        if until.is_some_and(|limit| due > limit) {
            break;
        }

        tokio::time::sleep_until(clock.instant_at(due)).await;

        let applied = pump.pump_to(due.max(clock.now()));
        summary.applied += applied;
        if applied > 0 {
            observe(pump);
        }
    }

    summary.stopped_at = clock.now();
    tracing::debug!(
        applied = summary.applied,
        stopped_at = summary.stopped_at,
        idle = summary.idle,
        "driver stopped"
    );
    summary
}
