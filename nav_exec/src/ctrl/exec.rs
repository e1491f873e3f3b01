//! # Control executive
//!
//! [`CtrlExec`] owns the connections to the robot's collaborators and runs one [`Phase`] at a
//! time at a fixed tick rate. Each tick it:
//!
//! 1. Polls the cancellation monitor, stopping the robot and returning if anything is wrong.
//! 2. Reads the latest pose and target snapshots.
//! 3. Steps the phase.
//! 4. Sends exactly one command to the actuation layer.
//! 5. Waits for the next tick.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlCommand;
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use util::{archive::Archiver, session, time::Rate};

use super::{CtrlParams, CtrlParamsError, Phase, PhaseExit, Step, TickInput};
use crate::{
    iface::{
        ActuationSink, CancellationMonitor, FrameTransform, LogVisSink, MountTransform, SinkError,
        VisSink,
    },
    loc::{LocMgr, Pose2D},
    per::{TargetMgr, TargetObservation},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Runs control phases against the robot.
pub struct CtrlExec {
    params: CtrlParams,

    loc: LocMgr,

    target: TargetMgr,

    sink: Box<dyn ActuationSink>,

    monitor: Box<dyn CancellationMonitor>,

    transform: Box<dyn FrameTransform>,

    vis: Box<dyn VisSink>,

    rate: Rate,

    /// Optional per-tick trace
    archiver: Option<Archiver>,

    /// Total number of ticks run over all phases
    num_ticks: u64,

    /// The last command sent to the actuation layer
    last_cmd: Option<ControlCommand>,
}

/// One row of the tick trace.
#[derive(Debug, Clone, Serialize)]
pub struct TickRecord {
    pub time_s: f64,
    pub tick: u64,
    pub phase: &'static str,
    pub x_m: f64,
    pub y_m: f64,
    pub yaw_rad: f64,
    pub target_visible: bool,
    pub linear_ms: f64,
    pub angular_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    #[error("No pose was received for {waited_s:.2} s")]
    PoseTimeout { waited_s: f64 },

    #[error("Could not send a command to the actuation layer: {0}")]
    Sink(SinkError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CtrlExec {
    /// Create a new executive.
    ///
    /// Detections are transformed into odom assuming the camera sits at the robot's origin, and
    /// visualisation goes to the log. Use [`CtrlExec::with_transform`] and
    /// [`CtrlExec::with_vis`] to replace these. Fails if the parameters can't describe a runnable
    /// loop.
    pub fn new(
        params: CtrlParams,
        loc: LocMgr,
        target: TargetMgr,
        sink: Box<dyn ActuationSink>,
        monitor: Box<dyn CancellationMonitor>,
    ) -> Result<Self, CtrlParamsError> {
        params.validate()?;

        let rate = if params.realtime {
            Rate::new(params.frequency_hz)?
        }
        else {
            Rate::unthrottled(params.frequency_hz)?
        };

        let transform = Box::new(MountTransform::new(
            loc.clone(),
            target.cam_mode().frame_id(),
            Pose2D::default(),
        ));

        Ok(Self {
            params,
            loc,
            target,
            sink,
            monitor,
            transform,
            vis: Box::new(LogVisSink),
            rate,
            archiver: None,
            num_ticks: 0,
            last_cmd: None,
        })
    }

    pub fn with_transform(mut self, transform: Box<dyn FrameTransform>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_vis(mut self, vis: Box<dyn VisSink>) -> Self {
        self.vis = vis;
        self
    }

    /// Record one [`TickRecord`] per tick into the given archive.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    pub fn last_cmd(&self) -> Option<ControlCommand> {
        self.last_cmd
    }

    pub fn target_mgr(&self) -> &TargetMgr {
        &self.target
    }

    /// Run the phase until it finishes, is cancelled, or fails.
    ///
    /// Whichever way the phase ends, the last command sent to the actuation layer is a stop
    /// (unless sending that stop is what failed).
    pub fn run<P: Phase>(&mut self, phase: &mut P) -> Result<PhaseExit<P::Outcome>, PhaseError> {
        let name = phase.name();
        let dt_s = self.rate.period_s();

        // Number of consecutive pose-less ticks after which the phase fails
        let max_pose_wait_ticks = ((self.params.pose_timeout_s / dt_s).round() as u64).max(1);
        let mut pose_wait_ticks = 0u64;

        info!("Entering {} phase", name);

        self.rate.restart();

        loop {
            // ---- CANCELLATION ----

            let interrupt = self.monitor.check();
            if !interrupt.is_fine() {
                warn!("{} phase cancelled by {} interrupt", name, interrupt);
                self.send(name, None, false, &ControlCommand::stop())?;
                return Ok(PhaseExit::Cancelled(interrupt));
            }

            // ---- INPUTS ----

            let pose = self.loc.get_pose();
            let obs = self.target.get_observation();

            // ---- STEP ----

            let step = if phase.needs_pose() && pose.is_none() {
                Step::WaitPose
            }
            else {
                let mut input = TickInput {
                    pose,
                    obs,
                    dt_s,
                    transform: self.transform.as_mut(),
                    vis: self.vis.as_mut(),
                };
                phase.step(&mut input)
            };

            // ---- OUTPUT ----

            match step {
                Step::Continue(cmd) => {
                    pose_wait_ticks = 0;
                    self.send(name, pose, obs.is_some(), &cmd)?;
                }
                Step::WaitPose => {
                    pose_wait_ticks += 1;
                    self.send(name, pose, obs.is_some(), &ControlCommand::stop())?;

                    if pose_wait_ticks == 1 {
                        warn!("{} phase is waiting for a pose", name);
                    }

                    if pose_wait_ticks >= max_pose_wait_ticks {
                        let waited_s = pose_wait_ticks as f64 * dt_s;
                        error!("{} phase failed, no pose for {:.2} s", name, waited_s);
                        return Err(PhaseError::PoseTimeout { waited_s });
                    }
                }
                Step::Finished(outcome) => {
                    self.send(name, pose, obs.is_some(), &ControlCommand::stop())?;
                    info!("{} phase complete after {} ticks", name, self.num_ticks);
                    return Ok(PhaseExit::Complete(outcome));
                }
            }

            self.rate.sleep();
        }
    }

    /// Send a command, count the tick and write its trace row.
    fn send(
        &mut self,
        phase: &'static str,
        pose: Option<Pose2D>,
        target_visible: bool,
        cmd: &ControlCommand,
    ) -> Result<(), PhaseError> {
        trace!(
            "[{}] tick {}: lin {:.3} m/s, ang {:.3} rad/s",
            phase,
            self.num_ticks,
            cmd.linear_ms,
            cmd.angular_rads
        );

        self.sink.send(cmd).map_err(|e| {
            error!("Could not send command: {}", e);
            PhaseError::Sink(e)
        })?;
        self.last_cmd = Some(*cmd);

        if let Some(ref mut a) = self.archiver {
            let p = pose.unwrap_or(Pose2D {
                x_m: f64::NAN,
                y_m: f64::NAN,
                yaw_rad: f64::NAN,
            });

            let record = TickRecord {
                time_s: session::get_elapsed_seconds(),
                tick: self.num_ticks,
                phase,
                x_m: p.x_m,
                y_m: p.y_m,
                yaw_rad: p.yaw_rad,
                target_visible,
                linear_ms: cmd.linear_ms,
                angular_rads: cmd.angular_rads,
            };

            // The trace is diagnostic only, losing it must not stop the robot
            if let Err(e) = a.serialise(record) {
                warn!("Could not write the tick trace, disabling it: {}", e);
                self.archiver = None;
            }
        }

        self.num_ticks += 1;

        Ok(())
    }
}

/// Convenience used by phases which want to debug-log the observation they acted on.
pub(crate) fn describe_obs(obs: &TargetObservation) -> String {
    match obs {
        TargetObservation::None => "none".into(),
        TargetObservation::Point { x_m, y_m } => format!("point ({:.2}, {:.2})", x_m, y_m),
        TargetObservation::OrientedPose(p) => {
            format!("pose ({:.2}, {:.2}, {:.2})", p.x_m, p.y_m, p.yaw_rad)
        }
    }
}

impl std::fmt::Debug for CtrlExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtrlExec")
            .field("params", &self.params)
            .field("cam_mode", &self.target.cam_mode())
            .field("num_ticks", &self.num_ticks)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        per::{CameraMode, Detection},
        snapshot::{snapshot_cell, SnapshotWriter},
    };
    use comms_if::interrupt::Interrupt;
    use std::sync::{Arc, Mutex};

    /// Records every command it's sent.
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<ControlCommand>>>);

    impl ActuationSink for Recorder {
        fn send(&mut self, cmd: &ControlCommand) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(*cmd);
            Ok(())
        }
    }

    impl Recorder {
        fn cmds(&self) -> Vec<ControlCommand> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Turns for a fixed number of ticks then finishes.
    struct Spin {
        ticks_left: u32,
        needs_pose: bool,
    }

    impl Phase for Spin {
        type Outcome = ();

        fn name(&self) -> &'static str {
            "Spin"
        }

        fn needs_pose(&self) -> bool {
            self.needs_pose
        }

        fn step(&mut self, _input: &mut TickInput) -> Step<()> {
            if self.ticks_left == 0 {
                return Step::Finished(());
            }
            self.ticks_left -= 1;
            Step::Continue(ControlCommand::point_turn(0.5))
        }
    }

    fn params() -> CtrlParams {
        CtrlParams {
            frequency_hz: 20.0,
            realtime: false,
            pose_timeout_s: 1.0,
            max_observation_age_s: 10.0,
        }
    }

    fn exec_with(
        monitor: Box<dyn CancellationMonitor>,
    ) -> (CtrlExec, Recorder, SnapshotWriter<Pose2D>, SnapshotWriter<Detection>) {
        let (pose_w, pose_r) = snapshot_cell();
        let (det_w, det_r) = snapshot_cell();
        let rec = Recorder::default();

        let exec = CtrlExec::new(
            params(),
            LocMgr::new(pose_r),
            TargetMgr::new(det_r, CameraMode::Sim, 10.0),
            Box::new(rec.clone()),
            monitor,
        )
        .unwrap();

        (exec, rec, pose_w, det_w)
    }

    #[test]
    fn test_invalid_params_rejected() {
        let (_pose_w, pose_r) = snapshot_cell();
        let (_det_w, det_r) = snapshot_cell();

        let exec = CtrlExec::new(
            CtrlParams {
                frequency_hz: f64::NAN,
                ..params()
            },
            LocMgr::new(pose_r),
            TargetMgr::new(det_r, CameraMode::Sim, 10.0),
            Box::new(Recorder::default()),
            Box::new(|| Interrupt::Fine),
        );
        assert!(matches!(exec, Err(CtrlParamsError::InvalidFrequency(_))));
    }

    #[test]
    fn test_finish_sends_stop() {
        let (mut exec, rec, _p, _d) = exec_with(Box::new(|| Interrupt::Fine));
        let mut phase = Spin {
            ticks_left: 3,
            needs_pose: false,
        };

        let exit = exec.run(&mut phase).unwrap();
        assert_eq!(exit, PhaseExit::Complete(()));

        let cmds = rec.cmds();
        assert_eq!(cmds.len(), 4);
        assert!(cmds[..3].iter().all(|c| c.angular_rads == 0.5));
        assert!(cmds[3].is_stop());
        assert_eq!(exec.num_ticks(), 4);
    }

    #[test]
    fn test_cancellation_sends_stop() {
        // Interrupt raised on the third poll
        let mut polls = 0;
        let monitor = move || {
            polls += 1;
            if polls >= 3 {
                Interrupt::Shutdown
            }
            else {
                Interrupt::Fine
            }
        };

        let (mut exec, rec, _p, _d) = exec_with(Box::new(monitor));
        let mut phase = Spin {
            ticks_left: 1000,
            needs_pose: false,
        };

        let exit = exec.run(&mut phase).unwrap();
        assert_eq!(exit, PhaseExit::Cancelled(Interrupt::Shutdown));
        assert!(!exit.is_complete());

        let cmds = rec.cmds();
        assert_eq!(cmds.len(), 3);
        assert!(cmds.last().unwrap().is_stop());
        assert_eq!(exec.last_cmd(), Some(ControlCommand::stop()));
    }

    #[test]
    fn test_pose_timeout() {
        let (mut exec, rec, _p, _d) = exec_with(Box::new(|| Interrupt::Fine));
        let mut phase = Spin {
            ticks_left: 1000,
            needs_pose: true,
        };

        match exec.run(&mut phase) {
            Err(PhaseError::PoseTimeout { waited_s }) => {
                approx::assert_relative_eq!(waited_s, 1.0, epsilon = 1e-9)
            }
            r => panic!("Expected a pose timeout, got {:?}", r.map(|_| ())),
        }

        // 1 s at 20 Hz, stopped the whole time
        let cmds = rec.cmds();
        assert_eq!(cmds.len(), 20);
        assert!(cmds.iter().all(|c| c.is_stop()));
    }

    #[test]
    fn test_pose_arrives_before_timeout() {
        let (mut exec, rec, mut pose_w, _d) = exec_with(Box::new(|| Interrupt::Fine));
        pose_w.publish(Pose2D::default());

        let mut phase = Spin {
            ticks_left: 2,
            needs_pose: true,
        };

        assert!(exec.run(&mut phase).unwrap().is_complete());
        assert_eq!(rec.cmds().len(), 3);
    }
}
