//! # Target observations

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::pose::Pose2D;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A target observation stamped with the sensor frame it was made in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Name of the frame the observation is expressed in, for example the camera's optical frame.
    pub frame_id: String,

    /// The observation itself.
    pub obs: TargetObservation,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What perception (or the mission layer) currently knows about the target.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetObservation {
    /// No target is currently detected.
    None,

    /// A target position without orientation.
    Point {
        x_m: f64,
        y_m: f64,
    },

    /// A target with full planar pose, for example a fiducial marker.
    OrientedPose(Pose2D),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Detection {
    /// An explicit "no detection" message from the given frame.
    pub fn none(frame_id: &str) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            obs: TargetObservation::None,
        }
    }
}

impl TargetObservation {
    /// Returns true if there is no target.
    pub fn is_none(&self) -> bool {
        matches!(self, TargetObservation::None)
    }

    /// Returns true if there is a target.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Position of the target, if any.
    pub fn position_m(&self) -> Option<(f64, f64)> {
        match self {
            TargetObservation::None => None,
            TargetObservation::Point { x_m, y_m } => Some((*x_m, *y_m)),
            TargetObservation::OrientedPose(p) => Some((p.x_m, p.y_m)),
        }
    }

    /// Straight line range from the observing frame's origin to the target, if any.
    pub fn range_m(&self) -> Option<f64> {
        self.position_m().map(|(x, y)| x.hypot(y))
    }
}

impl Default for TargetObservation {
    fn default() -> Self {
        TargetObservation::None
    }
}
