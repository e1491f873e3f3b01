//! General time utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono;
use log::warn;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed rate cycle scheduler.
///
/// Each call to [`Rate::sleep`] waits until one period has elapsed since the end of the previous
/// call. When the cycle overran the period no wait is made and a warning is issued.
#[derive(Debug, Clone)]
pub struct Rate {
    /// Nominal period of one cycle
    period: Duration,

    /// Instant at which the current cycle began
    cycle_start: Instant,

    /// If false the rate never sleeps, used for simulation and testing.
    throttled: bool,

    /// Number of consecutive cycle overruns
    pub num_consec_overruns: u64,
}

#[derive(Debug, Error)]
pub enum RateError {
    #[error("The rate frequency must be positive and finite, found {0} Hz")]
    InvalidFrequency(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Rate {
    /// Create a new rate running at the given frequency.
    pub fn new(frequency_hz: f64) -> Result<Self, RateError> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(RateError::InvalidFrequency(frequency_hz));
        }

        // Very high frequencies give a period under a nanosecond, which would never sleep
        let period = Duration::try_from_secs_f64(1.0 / frequency_hz)
            .map_err(|_| RateError::InvalidFrequency(frequency_hz))?;
        if period.is_zero() {
            return Err(RateError::InvalidFrequency(frequency_hz));
        }

        Ok(Self {
            period,
            cycle_start: Instant::now(),
            throttled: true,
            num_consec_overruns: 0,
        })
    }

    /// Create a new rate which reports the nominal period of the given frequency but never sleeps.
    pub fn unthrottled(frequency_hz: f64) -> Result<Self, RateError> {
        Ok(Self {
            throttled: false,
            ..Self::new(frequency_hz)?
        })
    }

    /// The nominal period of one cycle in seconds.
    pub fn period_s(&self) -> f64 {
        self.period.as_secs_f64()
    }

    /// Start timing a new cycle from now, discarding any time spent since the last cycle ended.
    pub fn restart(&mut self) {
        self.cycle_start = Instant::now();
        self.num_consec_overruns = 0;
    }

    /// Wait for the end of the current cycle.
    pub fn sleep(&mut self) {
        if !self.throttled {
            return;
        }

        let cycle_dur = Instant::now() - self.cycle_start;

        // Get sleep duration
        match self.period.checked_sub(cycle_dur) {
            Some(d) => {
                self.num_consec_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - self.period.as_secs_f64()
                );
                self.num_consec_overruns += 1;
            }
        }

        self.cycle_start = Instant::now();
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a number of seconds into a duration.
///
/// Zero, negative and NaN values give a zero duration, values too large to represent (including
/// infinity) give [`Duration::MAX`].
pub fn secs_to_duration(seconds: f64) -> Duration {
    if !(seconds > 0.0) {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    if let Some(ns) = duration.num_nanoseconds() {
        Some(ns as f64 / NANOS_PER_SECOND as f64)
    }
    else {
        None
    }
}
