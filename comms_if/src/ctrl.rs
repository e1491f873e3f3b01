//! # Velocity commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A body-rate command for the drive base.
///
/// One command is issued per control tick. The actuation layer keeps only the latest command and is
/// responsible for stopping the robot if commands stop arriving.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Forward speed in meters/second.
    ///
    /// Positive speeds are "forwards", negative speeds are "backwards"
    pub linear_ms: f64,

    /// Turn rate in radians/second.
    ///
    /// Follows the right hand rule about the robot's Z+ (upwards) axis, so that a positive turn
    /// rate will rotate the robot to the left.
    pub angular_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ControlCommand {
    /// Bring the robot to a full stop.
    pub fn stop() -> Self {
        Self::default()
    }

    /// A turn on the spot at the given rate.
    pub fn point_turn(angular_rads: f64) -> Self {
        Self {
            linear_ms: 0.0,
            angular_rads,
        }
    }

    /// A straight line drive at the given speed.
    pub fn straight(linear_ms: f64) -> Self {
        Self {
            linear_ms,
            angular_rads: 0.0,
        }
    }

    /// Returns true if this command holds the robot stationary.
    pub fn is_stop(&self) -> bool {
        self.linear_ms == 0.0 && self.angular_rads == 0.0
    }
}
