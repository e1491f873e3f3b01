//! # Regulator
//!
//! The PID controller shared by every control phase. Each phase owns its own regulators so that
//! integral and derivative state never leaks from one phase into another.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of a PID controller
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Gains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,
}

/// Output limits of a PID controller, inclusive.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

/// A PID controller with output saturation.
///
/// The integral and derivative terms are weighted by the tick period passed into
/// [`Regulator::compute`], so the same gains behave the same at any tick rate.
#[derive(Debug, Clone, Serialize)]
pub struct Regulator {
    gains: Gains,

    limits: Limits,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Gains {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d }
    }

    /// All three gains multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            k_p: self.k_p * factor,
            k_i: self.k_i * factor,
            k_d: self.k_d * factor,
        }
    }
}

impl Limits {
    /// Build limits from the two bounds, in either order.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Limits of `-max_abs` to `max_abs`.
    pub fn symmetric(max_abs: f64) -> Self {
        Self::new(-max_abs.abs(), max_abs.abs())
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

impl Regulator {
    /// Create a new controller with the given gains and output limits.
    pub fn new(gains: Gains, limits: Limits) -> Self {
        Self {
            gains,
            limits,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Get the output of the controller for the given error over a tick of `dt_s` seconds.
    ///
    /// The output is always finite and within the limits. A non-finite error produces zero output
    /// and leaves the internal state untouched.
    pub fn compute(&mut self, error: f64, dt_s: f64) -> f64 {
        if !error.is_finite() {
            return self.limits.clamp(0f64);
        }

        let dt = if dt_s.is_finite() && dt_s > 0f64 {
            Some(dt_s)
        }
        else {
            None
        };

        // Accumulate the integral term.
        //
        // If there's no valid time step we don't accumulate, adding the raw error instead would
        // produce a large spike compared to normal operation.
        if let Some(t) = dt {
            self.integral += error * t;
        }

        // Stop the integral winding up past what the output can express
        if self.gains.k_i != 0f64 {
            let bounds = Limits::new(
                self.limits.min / self.gains.k_i,
                self.limits.max / self.gains.k_i
            );
            self.integral = bounds.clamp(self.integral);
        }

        // Calculate the derivative.
        //
        // On the first call there is no previous error, so no derivative, which avoids a kick when
        // the phase starts.
        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) => (error - e) / t,
            _ => 0f64,
        };

        // Calculate the output
        let out =
            self.gains.k_p * error
            + self.gains.k_i * self.integral
            + self.gains.k_d * deriv;

        // Remember the previous error
        self.prev_error = Some(error);

        if out.is_finite() {
            self.limits.clamp(out)
        }
        else {
            self.limits.clamp(0f64)
        }
    }

    /// Get the output of the controller for a measured `state` which should be driven to
    /// `setpoint`.
    pub fn compute_to_setpoint(&mut self, state: f64, setpoint: f64, dt_s: f64) -> f64 {
        self.compute(setpoint - state, dt_s)
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }
}
