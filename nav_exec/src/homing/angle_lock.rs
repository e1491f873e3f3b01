//! # Angle lock
//!
//! Turns the robot to a fixed heading given relative to a reference pose, usually the target pose
//! found by the alignment loop. Uses the same control law as the alignment loop but with no search
//! and no dependence on detections.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlCommand;
use log::info;
use util::maths::{ang_dist, wrap_angle};

use super::HomingParams;
use crate::{
    ctrl::{Phase, Regulator, Step, TickInput},
    loc::Pose2D,
    per::CameraMode,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AngleLock {
    regulator: Regulator,

    threshold_rad: f64,

    /// Heading to lock to, in odom
    target_yaw_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LockOutcome {
    Locked,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AngleLock {
    /// Lock to `reference.yaw + offset_rad`, corrected by the camera's yaw offset.
    pub fn new(
        params: &HomingParams,
        cam_mode: CameraMode,
        reference: &Pose2D,
        offset_rad: f64,
    ) -> Self {
        Self {
            regulator: params.heading_regulator(),
            threshold_rad: params.alignment_threshold_rad,
            target_yaw_rad: wrap_angle(reference.yaw_rad + cam_mode.yaw_offset_rad() + offset_rad),
        }
    }

    pub fn target_yaw_rad(&self) -> f64 {
        self.target_yaw_rad
    }
}

impl Phase for AngleLock {
    type Outcome = LockOutcome;

    fn name(&self) -> &'static str {
        "AngleLock"
    }

    fn needs_pose(&self) -> bool {
        true
    }

    fn step(&mut self, input: &mut TickInput) -> Step<LockOutcome> {
        let pose = match input.pose {
            Some(p) => p,
            None => return Step::WaitPose,
        };

        let error = ang_dist(pose.yaw_rad, self.target_yaw_rad);

        if error.abs() < self.threshold_rad {
            info!(
                "Locked to {:.3} rad, error {:.3} rad",
                self.target_yaw_rad, error
            );
            return Step::Finished(LockOutcome::Locked);
        }

        Step::Continue(ControlCommand::point_turn(
            self.regulator.compute(error, input.dt_s),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ctrl::{CtrlParams, PhaseExit},
        sim::{SimParams, SimRover},
    };
    use approx::assert_relative_eq;
    use comms_if::interrupt::Interrupt;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_target_yaw() {
        let params = HomingParams::default();
        let reference = Pose2D::new(1.0, 1.0, PI);

        let lock = AngleLock::new(&params, CameraMode::Back, &reference, 0.25);
        assert_relative_eq!(lock.target_yaw_rad(), FRAC_PI_2 + 0.25, epsilon = 1e-12);

        // Wraps through pi
        let lock = AngleLock::new(&params, CameraMode::Sim, &reference, 0.25);
        assert_relative_eq!(lock.target_yaw_rad(), -FRAC_PI_2 + 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_lock_in_sim() {
        let ctrl_params = CtrlParams {
            realtime: false,
            ..Default::default()
        };
        let (sim, mut exec) =
            SimRover::with_exec(SimParams::default(), ctrl_params, || Interrupt::Fine).unwrap();

        // Reference heading of -pi/2 corrected by the sim camera offset is 0, lock to 1 rad
        let reference = Pose2D::new(-3.0, 0.0, -FRAC_PI_2);
        let mut lock = AngleLock::new(&HomingParams::default(), CameraMode::Sim, &reference, 1.0);

        assert_eq!(
            exec.run(&mut lock).unwrap(),
            PhaseExit::Complete(LockOutcome::Locked)
        );
        assert!((sim.pose().yaw_rad - 1.0).abs() < 0.1);

        // Turned on the spot the whole time
        assert!(sim.commands().iter().all(|c| c.linear_ms == 0.0));
        assert_eq!(sim.pose().x_m, 0.0);
    }
}
