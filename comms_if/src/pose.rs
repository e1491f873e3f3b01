//! # Planar pose

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::wrap_angle;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pose on the ground plane.
///
/// `yaw_rad` follows the right hand rule about the Z+ (upwards) axis, with zero along X+. Poses
/// built with [`Pose2D::new`] or deserialised always have their yaw in the range `(-pi, pi]`.
/// Struct literals are taken as given.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PoseFields")]
pub struct Pose2D {
    /// X position in meters
    pub x_m: f64,

    /// Y position in meters
    pub y_m: f64,

    /// Heading in radians
    pub yaw_rad: f64,
}

/// Deserialised form of a pose, before its yaw is normalised.
#[derive(Deserialize)]
struct PoseFields {
    x_m: f64,
    y_m: f64,
    yaw_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose2D {
    /// Create a new pose, normalising the yaw into `(-pi, pi]`.
    pub fn new(x_m: f64, y_m: f64, yaw_rad: f64) -> Self {
        Self {
            x_m,
            y_m,
            yaw_rad: wrap_angle(yaw_rad),
        }
    }

    /// Planar distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose2D) -> f64 {
        (other.x_m - self.x_m).hypot(other.y_m - self.y_m)
    }
}

impl From<PoseFields> for Pose2D {
    fn from(f: PoseFields) -> Self {
        Self::new(f.x_m, f.y_m, f.yaw_rad)
    }
}
