//! # Localisation module
//!
//! This module gives the control phases access to the robot's pose. Pose estimates are published
//! by the localisation stream at its own cadence into a snapshot cell; the control tick reads the
//! latest estimate through [`LocMgr`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Isometry2, Vector2};

use crate::snapshot::SnapshotReader;

pub use comms_if::pose::Pose2D;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Provides an interface for the localisation system of the robot.
#[derive(Debug, Clone)]
pub struct LocMgr {
    source: SnapshotReader<Pose2D>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocMgr {
    pub fn new(source: SnapshotReader<Pose2D>) -> Self {
        Self { source }
    }

    /// Get the most recent pose, or `None` if localisation has not produced one yet.
    pub fn get_pose(&self) -> Option<Pose2D> {
        self.source.latest_value()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a pose into the rigid transform which maps points from the pose's frame into the
/// frame the pose is expressed in.
pub fn to_isometry(pose: &Pose2D) -> Isometry2<f64> {
    Isometry2::new(Vector2::new(pose.x_m, pose.y_m), pose.yaw_rad)
}

/// Convert a rigid transform back into a pose.
pub fn from_isometry(iso: &Isometry2<f64>) -> Pose2D {
    Pose2D::new(
        iso.translation.vector[0],
        iso.translation.vector[1],
        iso.rotation.angle(),
    )
}

/// Express `pose`, given in a child frame, in the parent frame whose pose of the child is
/// `child_in_parent`.
pub fn compose(child_in_parent: &Pose2D, pose: &Pose2D) -> Pose2D {
    from_isometry(&(to_isometry(child_in_parent) * to_isometry(pose)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::snapshot::snapshot_cell;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_loc_mgr_latest() {
        let (mut w, r) = snapshot_cell();
        let loc = LocMgr::new(r);
        assert!(loc.get_pose().is_none());

        w.publish(Pose2D::new(1.0, 2.0, 0.5));
        w.publish(Pose2D::new(3.0, 4.0, 0.25));
        assert_eq!(loc.get_pose(), Some(Pose2D::new(3.0, 4.0, 0.25)));
    }

    #[test]
    fn test_compose() {
        // Robot at (1, 1) facing +Y, target 2 m straight ahead of it
        let robot = Pose2D::new(1.0, 1.0, FRAC_PI_2);
        let target_rb = Pose2D::new(2.0, 0.0, 0.0);

        let target = compose(&robot, &target_rb);
        assert_relative_eq!(target.x_m, 1.0, epsilon = 1e-12);
        assert_relative_eq!(target.y_m, 3.0, epsilon = 1e-12);
        assert_relative_eq!(target.yaw_rad, FRAC_PI_2, epsilon = 1e-12);
    }
}
