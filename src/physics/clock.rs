//! Tick sources for [`World::step`](super::world::World::step).
//!
//! The stepper measures elapsed time between calls itself, so it needs a
//! monotonic clock. Interactive hosts use [`MonotonicClock`]; fixed-rate hosts
//! and tests share a [`ManualClock`] and advance it explicitly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::warn;

/// A monotonic time source measured from an arbitrary origin.
pub trait StepClock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StepClock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same counter, so a host can keep one handle and give
/// another to each world it creates.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.micros
            .fetch_add(by.as_micros() as u64, Ordering::Relaxed);
    }

    /// Advance by a float number of seconds. Negative, NaN and infinite
    /// amounts leave the clock where it is.
    pub fn advance_secs(&self, seconds: f32) {
        match Duration::try_from_secs_f32(seconds) {
            Ok(by) => self.advance(by),
            Err(err) => warn!("Ignoring clock advance of {seconds}s: {err}"),
        }
    }
}

impl StepClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(16));
        assert_eq!(clock.now(), Duration::from_millis(16));
        clock.advance_secs(0.5);
        assert_eq!(handle.now(), Duration::from_millis(516));
    }

    #[test]
    fn test_manual_clock_ignores_negative_seconds() {
        let clock = ManualClock::new();
        clock.advance_secs(-1.0);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_manual_clock_ignores_non_finite_seconds() {
        let clock = ManualClock::new();
        clock.advance_secs(f32::NAN);
        clock.advance_secs(f32::INFINITY);
        clock.advance_secs(f32::NEG_INFINITY);
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance_secs(0.25);
        assert_eq!(clock.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_manual_clock_zero_seconds_is_a_no_op() {
        let clock = ManualClock::new();
        clock.advance_secs(0.0);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
