//! # External interfaces
//!
//! Traits at the boundary between the control phases and their collaborators: the actuation
//! layer, the interrupt monitor, the frame transform service, the debug visualiser and the
//! waypoint producer.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use comms_if::{ctrl::ControlCommand, interrupt::Interrupt};
use log::debug;

use crate::loc::{compose, LocMgr, Pose2D};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Name of the odometry frame, which all control is performed in.
pub const ODOM_FRAME: &str = "odom";

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Accepts one velocity command per tick.
pub trait ActuationSink {
    fn send(&mut self, cmd: &ControlCommand) -> Result<(), SinkError>;
}

/// Polled at the start of every tick. Anything other than `Interrupt::Fine` aborts the phase.
pub trait CancellationMonitor {
    fn check(&mut self) -> Interrupt;
}

/// Maps poses between reference frames.
pub trait FrameTransform {
    /// Express `pose`, given in `source_frame`, in `target_frame`, waiting at most `timeout`.
    fn transform(
        &mut self,
        pose: &Pose2D,
        source_frame: &str,
        target_frame: &str,
        timeout: Duration,
    ) -> Result<Pose2D, TransformError>;
}

/// Receives debug geometry. Failures are logged by the caller and never affect control.
pub trait VisSink {
    /// Show a pose, expressed in `frame`.
    fn show_pose(&mut self, label: &str, frame: &str, pose: &Pose2D) -> Result<(), VisError>;

    /// Show a line segment between two points, expressed in `frame`.
    fn show_line(
        &mut self,
        label: &str,
        frame: &str,
        start_m: (f64, f64),
        end_m: (f64, f64),
    ) -> Result<(), VisError>;
}

/// Produces the points a waypoint follower should drive through, in the odometry frame.
pub trait WaypointSource {
    fn next_waypoint(&mut self) -> Option<(f64, f64)>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An interrupt flag which can be raised from anywhere and is polled by the control loop.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<Mutex<Interrupt>>);

/// A visualiser which only writes to the debug log.
#[derive(Debug, Default)]
pub struct LogVisSink;

/// Transforms detections from a camera rigidly mounted on the robot into the odometry frame using
/// the latest localisation estimate.
#[derive(Debug, Clone)]
pub struct MountTransform {
    loc: LocMgr,

    /// Name of the camera frame
    cam_frame: String,

    /// Pose of the camera in the robot body frame
    mount: Pose2D,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("The actuation layer is not connected")]
    NotConnected,

    #[error("The actuation layer rejected the command: {0}")]
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Timed out after {0:?} waiting for a transform from {1} to {2}")]
    Timeout(Duration, String, String),

    #[error("No transform is known between {0} and {1}")]
    UnknownFrames(String, String),
}

#[derive(Debug, thiserror::Error)]
pub enum VisError {
    #[error("The visualiser is not available")]
    Unavailable,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<F> CancellationMonitor for F
where
    F: FnMut() -> Interrupt,
{
    fn check(&mut self) -> Interrupt {
        self()
    }
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an interrupt condition.
    pub fn raise(&self, interrupt: Interrupt) {
        match self.0.lock() {
            Ok(mut i) => *i = interrupt,
            Err(poisoned) => *poisoned.into_inner() = interrupt,
        }
    }

    /// Clear the interrupt, returning to `Interrupt::Fine`.
    pub fn clear(&self) {
        self.raise(Interrupt::Fine)
    }

    pub fn get(&self) -> Interrupt {
        match self.0.lock() {
            Ok(i) => *i,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl CancellationMonitor for InterruptFlag {
    fn check(&mut self) -> Interrupt {
        self.get()
    }
}

impl VisSink for LogVisSink {
    fn show_pose(&mut self, label: &str, frame: &str, pose: &Pose2D) -> Result<(), VisError> {
        debug!(
            "[vis] {} in {}: ({:.3}, {:.3}, {:.3})",
            label, frame, pose.x_m, pose.y_m, pose.yaw_rad
        );
        Ok(())
    }

    fn show_line(
        &mut self,
        label: &str,
        frame: &str,
        start_m: (f64, f64),
        end_m: (f64, f64),
    ) -> Result<(), VisError> {
        debug!(
            "[vis] {} in {}: ({:.3}, {:.3}) -> ({:.3}, {:.3})",
            label, frame, start_m.0, start_m.1, end_m.0, end_m.1
        );
        Ok(())
    }
}

impl MountTransform {
    pub fn new(loc: LocMgr, cam_frame: &str, mount: Pose2D) -> Self {
        Self {
            loc,
            cam_frame: cam_frame.to_string(),
            mount,
        }
    }
}

impl FrameTransform for MountTransform {
    fn transform(
        &mut self,
        pose: &Pose2D,
        source_frame: &str,
        target_frame: &str,
        timeout: Duration,
    ) -> Result<Pose2D, TransformError> {
        if source_frame != self.cam_frame || target_frame != ODOM_FRAME {
            return Err(TransformError::UnknownFrames(
                source_frame.to_string(),
                target_frame.to_string(),
            ));
        }

        // Without a localisation estimate the robot frame can't be placed in odom yet, which from
        // the caller's point of view is a lookup that didn't complete in time.
        let robot = self.loc.get_pose().ok_or_else(|| {
            TransformError::Timeout(timeout, source_frame.to_string(), target_frame.to_string())
        })?;

        Ok(compose(&robot, &compose(&self.mount, pose)))
    }
}

impl WaypointSource for VecDeque<(f64, f64)> {
    fn next_waypoint(&mut self) -> Option<(f64, f64)> {
        self.pop_front()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::snapshot::snapshot_cell;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_interrupt_flag() {
        let mut flag = InterruptFlag::new();
        let remote = flag.clone();
        assert_eq!(flag.check(), Interrupt::Fine);

        remote.raise(Interrupt::Overcurrent);
        assert_eq!(flag.check(), Interrupt::Overcurrent);

        remote.clear();
        assert!(flag.check().is_fine());
    }

    #[test]
    fn test_closure_monitor() {
        let mut n = 0;
        let mut monitor = move || {
            n += 1;
            if n > 2 {
                Interrupt::Stuck
            }
            else {
                Interrupt::Fine
            }
        };
        assert_eq!(monitor.check(), Interrupt::Fine);
        assert_eq!(monitor.check(), Interrupt::Fine);
        assert_eq!(monitor.check(), Interrupt::Stuck);
    }

    #[test]
    fn test_mount_transform() {
        let (mut w, r) = snapshot_cell();
        let mut tf = MountTransform::new(LocMgr::new(r), "cam", Pose2D::new(-0.3, 0.0, PI));
        let timeout = Duration::from_secs(1);
        let tag = Pose2D::new(2.0, 0.0, 0.0);

        // No pose yet
        assert!(matches!(
            tf.transform(&tag, "cam", ODOM_FRAME, timeout),
            Err(TransformError::Timeout(..))
        ));

        // Wrong frame
        w.publish(Pose2D::new(1.0, 0.0, 0.0));
        assert!(matches!(
            tf.transform(&tag, "other", ODOM_FRAME, timeout),
            Err(TransformError::UnknownFrames(..))
        ));

        // Rear facing camera 0.3 m behind the robot centre sees the tag 2 m away, so the tag is
        // 2.3 m behind the robot.
        let t = tf.transform(&tag, "cam", ODOM_FRAME, timeout).unwrap();
        assert_relative_eq!(t.x_m, -1.3, epsilon = 1e-12);
        assert_relative_eq!(t.y_m, 0.0, epsilon = 1e-12);
        assert_relative_eq!(t.yaw_rad, PI, epsilon = 1e-12);
    }
}
