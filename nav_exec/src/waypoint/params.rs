//! Waypoint control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::ctrl::{Gains, Limits, Regulator};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for waypoint control
#[derive(Deserialize, Debug, Clone)]
pub struct WaypointParams {
    /// Gains of the distance regulator
    pub linear_gains: Gains,

    /// Distance under which a waypoint is reached. Also the growth in distance over one tick
    /// which is taken to mean the robot has driven past the waypoint.
    pub linear_tolerance_m: f64,

    /// Maximum absolute speed demand
    pub max_linear_ms: f64,

    /// Gains of the heading regulator
    pub angular_gains: Gains,

    /// Heading error under which the robot is pointing at the waypoint
    pub angular_tolerance_rad: f64,

    /// Maximum absolute turn rate demand
    pub max_angular_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointParams {
    pub fn linear_regulator(&self) -> Regulator {
        Regulator::new(self.linear_gains, Limits::symmetric(self.max_linear_ms))
    }

    pub fn angular_regulator(&self) -> Regulator {
        Regulator::new(self.angular_gains, Limits::symmetric(self.max_angular_rads))
    }
}

impl Default for WaypointParams {
    fn default() -> Self {
        Self {
            linear_gains: Gains::new(2.0, 0.0, 0.0),
            linear_tolerance_m: 0.1,
            max_linear_ms: 1.0,
            angular_gains: Gains::new(2.5, 0.0, 0.0),
            angular_tolerance_rad: 5f64.to_radians(),
            max_angular_rads: 360f64.to_radians(),
        }
    }
}
