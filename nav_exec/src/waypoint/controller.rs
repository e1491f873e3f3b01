//! # Waypoint controller
//!
//! Point-to-point control towards a fixed target on the ground plane. The robot turns on the spot
//! until it faces the target, then drives straight at it:
//!
//! 1. The heading error is the wrapped difference between the bearing to the target and the
//!    robot's heading.
//! 2. The distance error is the distance to the target. If it grew by more than the linear
//!    tolerance since the last tick the robot is taken to have overshot, and the error's sign is
//!    flipped so the regulator drives it back.
//! 3. While the robot is neither facing the target nor at it, only the heading is controlled.
//!    Otherwise only the distance is controlled, until the target is reached.
//!
//! The distance error is evaluated before the heading decision so that the at-target flag used
//! for gating is always the current one. The robot can then never translate while both flags are
//! clear.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlCommand;
use log::trace;
use serde::Serialize;
use util::maths::wrap_angle;

use super::WaypointParams;
use crate::{ctrl::Regulator, loc::Pose2D};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WaypointCtrl {
    params: WaypointParams,

    linear: Regulator,

    angular: Regulator,

    /// Current target in odom
    target: Option<(f64, f64)>,

    at_angle_target: bool,

    at_linear_target: bool,

    /// Distance error from the previous tick, after any sign flip
    prev_linear_error: f64,

    report: WaypointReport,
}

/// Errors and flags from the latest tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WaypointReport {
    pub angular_error_rad: f64,
    pub linear_error_m: f64,
    pub at_angle_target: bool,
    pub at_linear_target: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WaypointCtrl {
    pub fn new(params: WaypointParams) -> Self {
        Self {
            linear: params.linear_regulator(),
            angular: params.angular_regulator(),
            params,
            target: None,
            at_angle_target: false,
            at_linear_target: false,
            prev_linear_error: f64::INFINITY,
            report: WaypointReport::default(),
        }
    }

    /// Set a new target, clearing all state from the previous one.
    pub fn set_target(&mut self, x_m: f64, y_m: f64) {
        self.target = Some((x_m, y_m));
        self.at_angle_target = false;
        self.at_linear_target = false;
        self.prev_linear_error = f64::INFINITY;
        self.linear.reset();
        self.angular.reset();
    }

    pub fn target(&self) -> Option<(f64, f64)> {
        self.target
    }

    pub fn at_angle_target(&self) -> bool {
        self.at_angle_target
    }

    pub fn at_linear_target(&self) -> bool {
        self.at_linear_target
    }

    pub fn report(&self) -> WaypointReport {
        self.report
    }

    /// Compute the command for this tick. With no target the robot is held still.
    pub fn compute(&mut self, pose: &Pose2D, dt_s: f64) -> ControlCommand {
        let (tx, ty) = match self.target {
            Some(t) => t,
            None => return ControlCommand::stop(),
        };

        let dx = tx - pose.x_m;
        let dy = ty - pose.y_m;

        // ---- ERRORS ----

        let angular_error = wrap_angle(dy.atan2(dx) - pose.yaw_rad);
        self.at_angle_target = angular_error.abs() < self.params.angular_tolerance_rad;

        let mut linear_error = dx.hypot(dy);
        if linear_error.abs() - self.prev_linear_error.abs() >= self.params.linear_tolerance_m {
            linear_error = -linear_error;
        }
        self.prev_linear_error = linear_error;
        self.at_linear_target = linear_error.abs() < self.params.linear_tolerance_m;

        // ---- GATING ----

        let turning = !self.at_angle_target && !self.at_linear_target;

        let angular_rads = if turning {
            -self.angular.compute_to_setpoint(angular_error, 0.0, dt_s)
        }
        else {
            0.0
        };

        let linear_ms = if !turning && !self.at_linear_target {
            -self.linear.compute_to_setpoint(linear_error, 0.0, dt_s)
        }
        else {
            0.0
        };

        self.report = WaypointReport {
            angular_error_rad: angular_error,
            linear_error_m: linear_error,
            at_angle_target: self.at_angle_target,
            at_linear_target: self.at_linear_target,
        };

        trace!("{:?}", self.report);

        ControlCommand {
            linear_ms,
            angular_rads,
        }
    }
}
