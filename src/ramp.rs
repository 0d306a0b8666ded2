//! Ramp control for the load generator
//!
//! A ramp moves the load level from wherever the previous ramp left it to a
//! target over a number of one-second ticks. The per-second step is the integer
//! quotient `(target - current) / duration`; each tick adds the step to a
//! running target and sends the rounded value, so rounding error does not
//! compound from tick to tick. After the last tick one exact `set_level(target)`
//! absorbs whatever the integer step left over.

use crate::clock::Clock;
use crate::loadgen::{LoadGenerator, LoadGeneratorError};
use std::time::Duration;
use thiserror::Error;

const TICK: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum RampError {
    #[error("Ramp duration must be at least one second")]
    ZeroDuration,

    #[error("Failed to set load level to {level}: {source}")]
    SetLevel {
        level: u32,
        #[source]
        source: LoadGeneratorError,
    },
}

/// Tracks the current load level across successive ramps
#[derive(Debug, Clone, Default)]
pub struct RampController {
    current_level: u32,
}

impl RampController {
    /// Controller for a generator currently at level 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Level reached by the last completed ramp
    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    /// Ramp to `target_level` over `duration_seconds` one-second ticks
    ///
    /// Issues exactly `duration_seconds` intermediate levels followed by one
    /// final `set_level(target_level)`. The first failing `set_level` aborts
    /// the ramp; the current level is then left unchanged.
    pub fn ramp<L, C>(
        &mut self,
        generator: &mut L,
        clock: &mut C,
        target_level: u32,
        duration_seconds: u32,
    ) -> Result<(), RampError>
    where
        L: LoadGenerator + ?Sized,
        C: Clock + ?Sized,
    {
        if duration_seconds == 0 {
            return Err(RampError::ZeroDuration);
        }

        let delta = i64::from(target_level) - i64::from(self.current_level);
        let per_second_rate = delta / i64::from(duration_seconds);
        let mut iteration_target = f64::from(self.current_level);

        tracing::debug!(
            from = self.current_level,
            to = target_level,
            seconds = duration_seconds,
            per_second_rate,
            "ramping load"
        );

        for tick in 1..=duration_seconds {
            iteration_target += per_second_rate as f64;
            let level = iteration_target.round().max(0.0) as u32;

            tracing::trace!(tick, level, "ramp tick");
            generator
                .set_level(level)
                .map_err(|source| RampError::SetLevel { level, source })?;

            clock.sleep(TICK);
        }

        generator
            .set_level(target_level)
            .map_err(|source| RampError::SetLevel {
                level: target_level,
                source,
            })?;

        self.current_level = target_level;
        Ok(())
    }
}
