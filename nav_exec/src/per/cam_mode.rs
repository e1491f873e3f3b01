//! # Camera mode
//!
//! The detection camera is chosen once at startup. Each mode fixes the detection topic, the frame
//! its detections are expressed in, and the yaw offset between the detected tag's orientation and
//! the heading the robot should hold to face it with that camera.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::FRAC_PI_2;

use log::info;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Detection topic of the front depth camera
pub const FRONT_CAM_TOPIC: &str = "/d455_back/camera/color/tag_detections";

/// Detection topic of the rear USB camera
pub const BACK_CAM_TOPIC: &str = "/usb_cam/tag_detections";

/// Detection topic of the simulated camera
pub const SIM_CAM_TOPIC: &str = "/d435_backward/color/tag_detections";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The camera used to detect the homing target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    Front,
    Back,
    Sim,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CameraMode {
    /// Pick the camera to use.
    ///
    /// In simulation the simulated camera is always used. On the real robot the back camera is
    /// preferred if its detection topic is being published, otherwise the front camera is used.
    pub fn resolve<S: AsRef<str>>(is_sim: bool, published_topics: &[S]) -> Self {
        let mode = if is_sim {
            CameraMode::Sim
        }
        else if published_topics.iter().any(|t| t.as_ref() == BACK_CAM_TOPIC) {
            CameraMode::Back
        }
        else {
            CameraMode::Front
        };

        info!("Camera mode resolved to {:?} ({})", mode, mode.topic());

        mode
    }

    /// The topic detections for this camera are published on.
    pub fn topic(&self) -> &'static str {
        match self {
            CameraMode::Front => FRONT_CAM_TOPIC,
            CameraMode::Back => BACK_CAM_TOPIC,
            CameraMode::Sim => SIM_CAM_TOPIC,
        }
    }

    /// The frame detections from this camera are expressed in.
    pub fn frame_id(&self) -> &'static str {
        match self {
            CameraMode::Front => "d455_back_color_optical_frame",
            CameraMode::Back => "usb_cam_link",
            CameraMode::Sim => "d435_backward_color_optical_frame",
        }
    }

    /// Offset added to the detected tag yaw (odom frame) to get the robot heading that faces the
    /// tag with this camera.
    ///
    /// The simulated tag model faces the opposite way to the real tags, hence the sign change.
    pub fn yaw_offset_rad(&self) -> f64 {
        match self {
            CameraMode::Front | CameraMode::Back => -FRAC_PI_2,
            CameraMode::Sim => FRAC_PI_2,
        }
    }

    /// Returns true for the simulated camera, which has a lower detection rate and so needs
    /// slower searching.
    pub fn is_sim(&self) -> bool {
        matches!(self, CameraMode::Sim)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve() {
        let none: [&str; 0] = [];
        assert_eq!(CameraMode::resolve(true, &[BACK_CAM_TOPIC]), CameraMode::Sim);
        assert_eq!(CameraMode::resolve(false, &["/odom", BACK_CAM_TOPIC]), CameraMode::Back);
        assert_eq!(CameraMode::resolve(false, &["/odom", FRONT_CAM_TOPIC]), CameraMode::Front);
        assert_eq!(CameraMode::resolve(false, &none), CameraMode::Front);
    }

    #[test]
    fn test_mode_pairs() {
        assert_eq!(CameraMode::Back.topic(), BACK_CAM_TOPIC);
        assert_eq!(CameraMode::Sim.yaw_offset_rad(), FRAC_PI_2);
        assert_eq!(CameraMode::Front.yaw_offset_rad(), -FRAC_PI_2);
        assert!(CameraMode::Sim.is_sim());
    }
}
