//! # Simulated camera
//!
//! Sees a single fiducial tag when it lies within the camera's field of view and range. Dropouts
//! can be scripted to exercise the controllers' miss handling.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{
    loc::{from_isometry, to_isometry, Pose2D},
    per::TargetObservation,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SimCamera {
    /// Pose of the camera in the robot body frame. The camera looks along its own X+ axis.
    pub mount: Pose2D,

    /// Full horizontal field of view
    pub fov_rad: f64,

    pub max_range_m: f64,

    /// Drop every Nth frame, 0 to never drop
    pub dropout_every: u64,

    /// Stop seeing anything from this frame on
    pub blind_after: Option<u64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimCamera {
    /// Express the tag's pose in the camera frame.
    pub fn tag_in_cam(&self, robot: &Pose2D, tag: &Pose2D) -> Pose2D {
        let cam = to_isometry(robot) * to_isometry(&self.mount);
        from_isometry(&(cam.inverse() * to_isometry(tag)))
    }

    /// Observe the tag for frame number `frame`.
    pub fn observe(&self, robot: &Pose2D, tag: &Pose2D, frame: u64) -> TargetObservation {
        if self.is_dropped(frame) {
            return TargetObservation::None;
        }

        let t = self.tag_in_cam(robot, tag);
        let range_m = t.x_m.hypot(t.y_m);
        let bearing_rad = t.y_m.atan2(t.x_m);

        if range_m <= self.max_range_m && bearing_rad.abs() <= 0.5 * self.fov_rad {
            TargetObservation::OrientedPose(t)
        }
        else {
            TargetObservation::None
        }
    }

    fn is_dropped(&self, frame: u64) -> bool {
        if let Some(b) = self.blind_after {
            if frame >= b {
                return true;
            }
        }

        self.dropout_every > 0 && frame > 0 && frame % self.dropout_every == 0
    }
}
