//! Clock abstraction
//!
//! Everything in the orchestrator measures time in virtual milliseconds since the
//! clock's origin. [`ManualClock`] only moves when told to, which makes timing tests
//! exact. [`TokioClock`] follows `tokio::time`, so it also honours a paused runtime.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Virtual milliseconds since a clock's origin
pub type Millis = u64;

/// Source of the current virtual time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in milliseconds since origin
    fn now(&self) -> Millis;
}

/// Hand-driven clock for deterministic tests
///
/// Clones share the same underlying counter, so a test can keep one handle and give
/// another to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at time zero
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `delta` milliseconds
    #[inline]
    pub fn advance(&self, delta: Millis) -> Millis {
        self.now.fetch_add(delta, Ordering::SeqCst) + delta
    }

    /// Jump to an absolute time. Time never moves backwards.
    #[inline]
    pub fn set(&self, at: Millis) {
        self.now.fetch_max(at, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Clock backed by `tokio::time`, optionally running faster than wall time
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
    speed: f64,
}

impl TokioClock {
    /// Start a clock at the current tokio instant, running at wall speed
    #[inline]
    #[must_use]
    pub fn start() -> Self {
        Self::with_speed(1.0)
    }

    /// Start a clock that runs `speed` times faster than wall time
    ///
    /// Non-positive or non-finite speeds fall back to 1.0.
    #[must_use]
    pub fn with_speed(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
        Self {
            origin: Instant::now(),
            speed,
        }
    }

    /// Playback speed multiplier
    #[inline]
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Tokio instant at which virtual time `at` is reached
    #[must_use]
    pub fn instant_at(&self, at: Millis) -> Instant {
        #[allow(clippy::cast_precision_loss)]
        let wall_ms = at as f64 / self.speed;
        self.origin + Duration::from_secs_f64(wall_ms / 1000.0)
    }
}

impl Clock for TokioClock {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn now(&self) -> Millis {
        let elapsed = self.origin.elapsed().as_secs_f64() * 1000.0;
        (elapsed * self.speed) as Millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_shares_time_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        assert_eq!(clock.now(), 0);
        handle.advance(250);
        assert_eq!(clock.now(), 250);
        assert_eq!(clock.advance(50), 300);
    }

    #[test]
    fn manual_clock_never_moves_backwards() {
        let clock = ManualClock::new();
        clock.set(1_000);
        clock.set(400);
        assert_eq!(clock.now(), 1_000);
    }

    #[test]
    fn tokio_clock_rejects_bad_speed() {
        assert!((TokioClock::with_speed(0.0).speed() - 1.0).abs() < f64::EPSILON);
        assert!((TokioClock::with_speed(f64::NAN).speed() - 1.0).abs() < f64::EPSILON);
        assert!((TokioClock::with_speed(4.0).speed() - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::with_speed(2.0);
        assert_eq!(clock.now(), 0);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(clock.now(), 1_000);

        let target = clock.instant_at(3_000);
        tokio::time::sleep_until(target).await;
        assert!(clock.now() >= 3_000);
    }
}
