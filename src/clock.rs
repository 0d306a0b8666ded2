//! Blocking waits used between ramp ticks and trial phases

use std::time::Duration;

/// Source of blocking waits
///
/// The calibration loop is strictly sequential: a wait blocks the whole run.
/// Tests substitute a clock that records the requested waits instead.
pub trait Clock {
    fn sleep(&mut self, duration: Duration);
}

/// Real wall-clock waits
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadClock;

impl Clock for ThreadClock {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
