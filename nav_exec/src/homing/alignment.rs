//! # Alignment loop
//!
//! Brings the robot's heading into line with a detected target. The loop first searches for the
//! target with a [`HeadingSearch`], then turns on the spot until the heading error derived from
//! the target's orientation is under the alignment threshold.
//!
//! Detections are transformed into the odometry frame and the last good target pose is kept, so
//! the robot keeps turning towards where the target was while it's briefly out of view or the
//! transform service is slow.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use comms_if::ctrl::ControlCommand;
use log::{debug, info, warn};
use serde::Serialize;
use util::{
    maths::{ang_dist, wrap_angle},
    time::secs_to_duration,
};

use super::{HeadingSearch, HomingParams, SearchOutcome};
use crate::{
    ctrl::{Phase, Regulator, Step, TickInput},
    iface::ODOM_FRAME,
    loc::Pose2D,
    per::{CameraMode, TargetObservation},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Aligns the robot's heading with a detected target.
#[derive(Debug, Clone)]
pub struct AlignmentLoop {
    state: AlignState,

    regulator: Regulator,

    threshold_rad: f64,

    standoff_m: f64,

    transform_timeout: Duration,

    cam_frame: &'static str,

    yaw_offset_rad: f64,

    /// Last target pose successfully transformed into odom
    target_odom: Option<Pose2D>,

    /// Last observation of the target in the camera frame
    last_obs: TargetObservation,

    status: AlignStatus,
}

/// Diagnostic status of the alignment, updated every aligning tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AlignStatus {
    /// Heading error to the derived target heading
    pub angular_error_rad: Option<f64>,

    /// Planar distance between robot and target
    pub distance_m: Option<f64>,

    /// Standoff distance minus the current distance
    pub standoff_error_m: Option<f64>,

    /// True if the target was observed this tick
    pub target_visible: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum AlignState {
    Searching(HeadingSearch),
    Aligning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignOutcome {
    /// Heading is aligned with the target, whose pose in odom is given.
    Done { target_odom: Pose2D },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AlignmentLoop {
    pub fn new(params: &HomingParams, cam_mode: CameraMode) -> Self {
        Self {
            state: AlignState::Searching(HeadingSearch::from_params(params, cam_mode)),
            regulator: params.heading_regulator(),
            threshold_rad: params.alignment_threshold_rad,
            standoff_m: params.standoff_m,
            transform_timeout: secs_to_duration(params.transform_timeout_s),
            cam_frame: cam_mode.frame_id(),
            yaw_offset_rad: cam_mode.yaw_offset_rad(),
            target_odom: None,
            last_obs: TargetObservation::None,
            status: AlignStatus::default(),
        }
    }

    pub fn status(&self) -> AlignStatus {
        self.status
    }

    /// The last observation of the target in the camera frame.
    pub fn last_observation(&self) -> TargetObservation {
        self.last_obs
    }

    /// Returns true once the search is over and the loop is turning towards the target.
    pub fn is_aligning(&self) -> bool {
        matches!(self.state, AlignState::Aligning)
    }

    /// Update the cached target from this tick's observation.
    fn refresh_target(&mut self, input: &mut TickInput) {
        let tag = match input.obs {
            TargetObservation::OrientedPose(p) => p,
            TargetObservation::Point { .. } => {
                debug!("Target observation has no orientation, can't align to it");
                return;
            }
            TargetObservation::None => return,
        };

        match input
            .transform
            .transform(&tag, self.cam_frame, ODOM_FRAME, self.transform_timeout)
        {
            Ok(t) => {
                self.target_odom = Some(t);

                if let Err(e) = input.vis.show_pose("homing_target", ODOM_FRAME, &t) {
                    debug!("Could not visualise the target: {}", e);
                }
            }
            Err(e) => warn!("Could not transform the target into odom, retrying: {}", e),
        }
    }

    fn align(&mut self, input: &mut TickInput) -> Step<AlignOutcome> {
        let pose = match input.pose {
            Some(p) => p,
            None => return Step::WaitPose,
        };

        self.status.target_visible = input.obs.is_some();
        if input.obs.is_some() {
            self.last_obs = input.obs;
        }

        self.refresh_target(input);

        let target = match self.target_odom {
            Some(t) => t,
            None => {
                debug!("No target pose yet, holding");
                return Step::Continue(ControlCommand::stop());
            }
        };

        let target_yaw_rad = wrap_angle(target.yaw_rad + self.yaw_offset_rad);
        let angular_error = ang_dist(pose.yaw_rad, target_yaw_rad);
        let distance_m = pose.distance_to(&target);

        self.status.angular_error_rad = Some(angular_error);
        self.status.distance_m = Some(distance_m);
        self.status.standoff_error_m = Some(self.standoff_m - distance_m);

        debug!(
            "Aligning: heading error {:.3} rad, distance {:.3} m",
            angular_error, distance_m
        );

        if angular_error.abs() < self.threshold_rad {
            info!(
                "Aligned with target at ({:.2}, {:.2}), heading error {:.3} rad",
                target.x_m, target.y_m, angular_error
            );
            return Step::Finished(AlignOutcome::Done {
                target_odom: target,
            });
        }

        Step::Continue(ControlCommand::point_turn(
            self.regulator.compute(angular_error, input.dt_s),
        ))
    }
}

impl Phase for AlignmentLoop {
    type Outcome = AlignOutcome;

    fn name(&self) -> &'static str {
        "Alignment"
    }

    fn needs_pose(&self) -> bool {
        self.is_aligning()
    }

    fn step(&mut self, input: &mut TickInput) -> Step<AlignOutcome> {
        match self.state {
            AlignState::Searching(ref mut search) => match search.step(input) {
                Step::Finished(SearchOutcome::Detected) => {
                    info!("Search complete, aligning");
                    self.last_obs = input.obs;
                    self.state = AlignState::Aligning;
                    Step::Continue(ControlCommand::stop())
                }
                Step::Continue(cmd) => Step::Continue(cmd),
                Step::WaitPose => Step::WaitPose,
            },
            AlignState::Aligning => self.align(input),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ctrl::{CtrlParams, PhaseExit},
        iface::{FrameTransform, LogVisSink, TransformError},
        sim::{SimParams, SimRover},
    };
    use approx::assert_relative_eq;
    use comms_if::interrupt::Interrupt;
    use std::f64::consts::FRAC_PI_2;

    /// Transform which fails a fixed number of times then passes poses through unchanged.
    struct Flaky {
        failures_left: u32,
    }

    impl FrameTransform for Flaky {
        fn transform(
            &mut self,
            pose: &Pose2D,
            source_frame: &str,
            target_frame: &str,
            timeout: Duration,
        ) -> Result<Pose2D, TransformError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                Err(TransformError::Timeout(
                    timeout,
                    source_frame.into(),
                    target_frame.into(),
                ))
            }
            else {
                Ok(*pose)
            }
        }
    }

    fn aligning(cam_mode: CameraMode) -> AlignmentLoop {
        let mut l = AlignmentLoop::new(&HomingParams::default(), cam_mode);
        l.state = AlignState::Aligning;
        l
    }

    fn step(
        l: &mut AlignmentLoop,
        tf: &mut dyn FrameTransform,
        pose: Pose2D,
        obs: TargetObservation,
    ) -> Step<AlignOutcome> {
        let mut vis = LogVisSink;
        let mut input = TickInput {
            pose: Some(pose),
            obs,
            dt_s: 0.05,
            transform: tf,
            vis: &mut vis,
        };
        l.step(&mut input)
    }

    #[test]
    fn test_turns_towards_target_heading() {
        // A tighter threshold than the default, which is under the regulator's saturation error
        let params = HomingParams {
            alignment_threshold_rad: 0.05,
            ..HomingParams::default()
        };
        let mut l = AlignmentLoop::new(&params, CameraMode::Back);
        l.state = AlignState::Aligning;
        let mut tf = Flaky { failures_left: 0 };

        // Tag yaw of pi/2 with the back camera offset gives a target heading of 0
        let tag = TargetObservation::OrientedPose(Pose2D::new(2.0, 0.0, FRAC_PI_2));

        // Gain of 10 saturates at the 1 rad/s limit
        match step(&mut l, &mut tf, Pose2D::new(0.0, 0.0, -0.5), tag) {
            Step::Continue(c) => {
                assert_eq!(c.linear_ms, 0.0);
                assert_relative_eq!(c.angular_rads, 1.0);
            }
            s => panic!("Unexpected step {:?}", s),
        }

        // Small error, unsaturated output
        match step(&mut l, &mut tf, Pose2D::new(0.0, 0.0, -0.06), tag) {
            Step::Continue(c) => assert_relative_eq!(c.angular_rads, 0.6, epsilon = 1e-9),
            s => panic!("Unexpected step {:?}", s),
        }

        // Within the threshold
        assert_eq!(
            step(&mut l, &mut tf, Pose2D::new(0.0, 0.0, 0.03), tag),
            Step::Finished(AlignOutcome::Done {
                target_odom: Pose2D::new(2.0, 0.0, FRAC_PI_2)
            })
        );
    }

    #[test]
    fn test_transform_failure_reuses_cached_target() {
        let mut l = aligning(CameraMode::Sim);
        let mut tf = Flaky { failures_left: 0 };
        let tag = TargetObservation::OrientedPose(Pose2D::new(1.0, 1.0, 0.0));

        // No target yet, hold still
        assert_eq!(
            step(&mut l, &mut Flaky { failures_left: 1 }, Pose2D::default(), tag),
            Step::Continue(ControlCommand::stop())
        );

        // Target cached, sim offset gives a target heading of pi/2
        assert!(matches!(
            step(&mut l, &mut tf, Pose2D::default(), tag),
            Step::Continue(_)
        ));
        assert_relative_eq!(l.status().angular_error_rad.unwrap(), FRAC_PI_2);

        // The transform times out, then the target is lost from view. The cache keeps control
        // going either way.
        let mut failing = Flaky { failures_left: 10 };
        let moved = TargetObservation::OrientedPose(Pose2D::new(5.0, 5.0, 1.0));
        for obs in [moved, moved, TargetObservation::None, TargetObservation::None].iter() {
            match step(&mut l, &mut failing, Pose2D::default(), *obs) {
                Step::Continue(c) => assert_relative_eq!(c.angular_rads, 1.0),
                s => panic!("Unexpected step {:?}", s),
            }
            assert_relative_eq!(l.status().distance_m.unwrap(), 2f64.sqrt());
        }
        assert!(!l.status().target_visible);
    }

    #[test]
    fn test_standoff_error_reported() {
        let mut l = aligning(CameraMode::Back);
        let mut tf = Flaky { failures_left: 0 };
        let tag = TargetObservation::OrientedPose(Pose2D::new(3.0, 4.0, 0.0));

        step(&mut l, &mut tf, Pose2D::new(0.0, 0.0, 1.0), tag);

        let status = l.status();
        assert_relative_eq!(status.distance_m.unwrap(), 5.0);
        assert_relative_eq!(status.standoff_error_m.unwrap(), 0.8 - 5.0);
        assert!(status.target_visible);
    }

    #[test]
    fn test_point_observation_does_not_align() {
        let mut l = aligning(CameraMode::Back);
        let mut tf = Flaky { failures_left: 0 };

        assert_eq!(
            step(
                &mut l,
                &mut tf,
                Pose2D::default(),
                TargetObservation::Point { x_m: 1.0, y_m: 0.0 }
            ),
            Step::Continue(ControlCommand::stop())
        );
    }

    #[test]
    fn test_alignment_in_sim() {
        let sim_params = SimParams {
            initial_pose: Pose2D::new(0.0, 0.0, -1.0),
            ..SimParams::default()
        };
        let ctrl_params = CtrlParams {
            realtime: false,
            ..Default::default()
        };
        let (sim, mut exec) =
            SimRover::with_exec(sim_params, ctrl_params, || Interrupt::Fine).unwrap();

        let mut align = AlignmentLoop::new(&HomingParams::default(), CameraMode::Sim);

        let target_odom = match exec.run(&mut align).unwrap() {
            PhaseExit::Complete(AlignOutcome::Done { target_odom }) => target_odom,
            e => panic!("Unexpected exit {:?}", e),
        };

        // The target is the simulated tag, and the robot faces it within the threshold
        let tag = SimParams::default().tag_pose;
        assert_relative_eq!(target_odom.x_m, tag.x_m, epsilon = 1e-9);
        assert_relative_eq!(target_odom.y_m, tag.y_m, epsilon = 1e-9);
        assert!(wrap_angle(tag.yaw_rad + FRAC_PI_2 - sim.pose().yaw_rad).abs() < 0.1);
        assert!(sim.last_command().unwrap().is_stop());
    }

    #[test]
    fn test_alignment_without_target_runs_until_cancelled() {
        let sim_params = SimParams {
            max_range_m: 0.1,
            ..SimParams::default()
        };
        let ctrl_params = CtrlParams {
            realtime: false,
            ..Default::default()
        };

        let mut n = 0;
        let monitor = move || {
            n += 1;
            if n > 200 {
                Interrupt::Shutdown
            }
            else {
                Interrupt::Fine
            }
        };

        let (sim, mut exec) = SimRover::with_exec(sim_params, ctrl_params, monitor).unwrap();
        let mut align = AlignmentLoop::new(&HomingParams::default(), CameraMode::Sim);

        assert_eq!(
            exec.run(&mut align).unwrap(),
            PhaseExit::Cancelled(Interrupt::Shutdown)
        );
        assert!(!align.is_aligning());
        assert!(sim.last_command().unwrap().is_stop());
    }
}
