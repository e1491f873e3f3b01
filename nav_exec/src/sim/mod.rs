//! # Simulation module
//!
//! A lightweight kinematic simulator standing in for the robot. [`SimRover`] is an
//! [`ActuationSink`]: every command it receives moves the simulated robot forward by one tick,
//! after which it publishes the new pose and the simulated camera's detection, exactly as the
//! localisation and perception streams would on the real robot.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod camera;
mod rover;

pub use camera::SimCamera;
pub use rover::{integrate, NoiseGenerator};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    f64::consts::{FRAC_PI_2, PI, TAU},
    sync::{Arc, Mutex, MutexGuard},
};

use comms_if::ctrl::ControlCommand;
use log::debug;
use serde::Deserialize;

use crate::{
    ctrl::{CtrlExec, CtrlParams, CtrlParamsError},
    iface::{ActuationSink, CancellationMonitor, MountTransform, SinkError},
    loc::{LocMgr, Pose2D},
    per::{CameraMode, Detection, TargetMgr},
    snapshot::{snapshot_cell, SnapshotReader, SnapshotWriter},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated world.
#[derive(Deserialize, Debug, Clone)]
pub struct SimParams {
    /// Starting pose of the robot in odom
    pub initial_pose: Pose2D,

    /// Pose of the fiducial tag in odom
    pub tag_pose: Pose2D,

    /// Pose of the camera in the robot body frame
    pub cam_mount: Pose2D,

    /// Full horizontal field of view of the camera
    pub fov_rad: f64,

    /// Maximum detection range of the camera
    pub max_range_m: f64,

    /// Drop every Nth detection, 0 to never drop
    pub dropout_every: u64,

    /// Stop detecting anything after this many ticks
    pub blind_after_tick: Option<u64>,

    /// Don't publish any pose until this many ticks have run
    pub pose_start_tick: u64,

    /// Amplitude of uniform noise on the published position
    pub pos_noise_m: f64,

    /// Amplitude of uniform noise on the published heading
    pub yaw_noise_rad: f64,

    pub seed: u64,
}

/// The simulated robot.
///
/// Cloning gives another handle to the same robot.
#[derive(Debug, Clone)]
pub struct SimRover {
    state: Arc<Mutex<SimState>>,
}

#[derive(Debug)]
struct SimState {
    /// True pose of the robot
    pose: Pose2D,

    tag_pose: Pose2D,

    camera: SimCamera,

    dt_s: f64,

    /// Number of commands integrated so far
    tick: u64,

    pose_start_tick: u64,

    pos_noise_m: f64,

    yaw_noise_rad: f64,

    noise: NoiseGenerator,

    pose_writer: SnapshotWriter<Pose2D>,

    det_writer: SnapshotWriter<Detection>,

    /// Every command received
    commands: Vec<ControlCommand>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("The simulation time step must be positive and finite, found {0}")]
    InvalidTimeStep(f64),

    #[error("The camera field of view must be in (0, 2pi], found {0}")]
    InvalidFov(f64),

    #[error("The camera range must be positive, found {0}")]
    InvalidRange(f64),

    #[error("Invalid control parameters: {0}")]
    Ctrl(#[from] CtrlParamsError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimParams {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.fov_rad > 0.0 && self.fov_rad <= TAU) {
            return Err(SimError::InvalidFov(self.fov_rad));
        }
        if !(self.max_range_m > 0.0) {
            return Err(SimError::InvalidRange(self.max_range_m));
        }
        Ok(())
    }
}

impl Default for SimParams {
    /// A rear facing camera 0.3 m behind the robot's centre, with the tag 3 m behind the robot and
    /// oriented so that the robot faces it with the camera when its heading is zero.
    fn default() -> Self {
        Self {
            initial_pose: Pose2D::default(),
            tag_pose: Pose2D::new(-3.0, 0.0, -FRAC_PI_2),
            cam_mount: Pose2D::new(-0.3, 0.0, PI),
            fov_rad: 1.2,
            max_range_m: 5.0,
            dropout_every: 0,
            blind_after_tick: None,
            pose_start_tick: 0,
            pos_noise_m: 0.0,
            yaw_noise_rad: 0.0,
            seed: 0,
        }
    }
}

impl SimRover {
    /// Create a new simulated robot stepping `dt_s` seconds per command.
    ///
    /// Returns the robot along with readers for its pose and detection streams. The initial pose
    /// and detection are published straight away (unless the pose is delayed).
    pub fn new(
        params: SimParams,
        dt_s: f64,
    ) -> Result<(Self, SnapshotReader<Pose2D>, SnapshotReader<Detection>), SimError> {
        params.validate()?;
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(SimError::InvalidTimeStep(dt_s));
        }

        let (pose_writer, pose_reader) = snapshot_cell();
        let (det_writer, det_reader) = snapshot_cell();

        let mut state = SimState {
            pose: params.initial_pose,
            tag_pose: params.tag_pose,
            camera: SimCamera {
                mount: params.cam_mount,
                fov_rad: params.fov_rad,
                max_range_m: params.max_range_m,
                dropout_every: params.dropout_every,
                blind_after: params.blind_after_tick,
            },
            dt_s,
            tick: 0,
            pose_start_tick: params.pose_start_tick,
            pos_noise_m: params.pos_noise_m,
            yaw_noise_rad: params.yaw_noise_rad,
            noise: NoiseGenerator::new(params.seed),
            pose_writer,
            det_writer,
            commands: Vec::new(),
        };
        state.publish();

        Ok((
            Self {
                state: Arc::new(Mutex::new(state)),
            },
            pose_reader,
            det_reader,
        ))
    }

    /// Create a simulated robot and a control executive wired to it through the simulated camera.
    pub fn with_exec<M>(
        params: SimParams,
        ctrl_params: CtrlParams,
        monitor: M,
    ) -> Result<(Self, CtrlExec), SimError>
    where
        M: CancellationMonitor + 'static,
    {
        ctrl_params.validate()?;

        let mount = params.cam_mount;
        let (sim, pose_reader, det_reader) = Self::new(params, 1.0 / ctrl_params.frequency_hz)?;

        let loc = LocMgr::new(pose_reader);
        let target = TargetMgr::new(
            det_reader,
            CameraMode::Sim,
            ctrl_params.max_observation_age_s,
        );
        let transform = MountTransform::new(loc.clone(), CameraMode::Sim.frame_id(), mount);

        let exec = CtrlExec::new(ctrl_params, loc, target, Box::new(sim.clone()), Box::new(monitor))?
            .with_transform(Box::new(transform));

        Ok((sim, exec))
    }

    /// The true pose of the robot.
    pub fn pose(&self) -> Pose2D {
        self.lock().pose
    }

    /// Every command received so far.
    pub fn commands(&self) -> Vec<ControlCommand> {
        self.lock().commands.clone()
    }

    pub fn last_command(&self) -> Option<ControlCommand> {
        self.lock().commands.last().copied()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ActuationSink for SimRover {
    fn send(&mut self, cmd: &ControlCommand) -> Result<(), SinkError> {
        if !(cmd.linear_ms.is_finite() && cmd.angular_rads.is_finite()) {
            return Err(SinkError::Rejected(format!("non-finite command {:?}", cmd)));
        }

        let mut state = self.lock();
        state.step(cmd);

        Ok(())
    }
}

impl SimState {
    fn step(&mut self, cmd: &ControlCommand) {
        self.pose = integrate(&self.pose, cmd, self.dt_s);
        self.tick += 1;
        self.commands.push(*cmd);
        self.publish();
    }

    /// Publish the current pose and detection.
    fn publish(&mut self) {
        if self.tick >= self.pose_start_tick {
            let p = self
                .noise
                .perturb(&self.pose, self.pos_noise_m, self.yaw_noise_rad);
            self.pose_writer.publish(p);
        }

        let obs = self.camera.observe(&self.pose, &self.tag_pose, self.tick);
        debug!("[sim] tick {}: pose {:?}, sees {}", self.tick, self.pose, obs.is_some());

        self.det_writer.publish(Detection {
            frame_id: CameraMode::Sim.frame_id().to_string(),
            obs,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ctrl::{PhaseError, Phase, Step, TickInput},
        homing::{AngleLock, HomingParams},
    };
    use comms_if::interrupt::Interrupt;

    #[test]
    fn test_invalid_params() {
        let p = SimParams {
            fov_rad: 0.0,
            ..SimParams::default()
        };
        assert!(matches!(SimRover::new(p, 0.05), Err(SimError::InvalidFov(_))));
        assert!(matches!(
            SimRover::new(SimParams::default(), 0.0),
            Err(SimError::InvalidTimeStep(_))
        ));

        // A zero control frequency is rejected before anything is built
        let ctrl_params = CtrlParams {
            frequency_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            SimRover::with_exec(SimParams::default(), ctrl_params, || Interrupt::Fine),
            Err(SimError::Ctrl(CtrlParamsError::InvalidFrequency(_)))
        ));
    }

    #[test]
    fn test_publishes_on_construction() {
        let (_sim, pose, det) = SimRover::new(SimParams::default(), 0.05).unwrap();
        assert_eq!(pose.latest_value(), Some(Pose2D::default()));

        let d = det.latest_value().unwrap();
        assert_eq!(d.frame_id, CameraMode::Sim.frame_id());
        assert!(d.obs.is_some());
    }

    #[test]
    fn test_send_moves_robot() {
        let (mut sim, pose, _det) = SimRover::new(SimParams::default(), 0.1).unwrap();

        sim.send(&ControlCommand::straight(1.0)).unwrap();
        sim.send(&ControlCommand::straight(1.0)).unwrap();

        approx::assert_relative_eq!(sim.pose().x_m, 0.2);
        assert_eq!(pose.latest_value(), Some(sim.pose()));
        assert_eq!(sim.commands().len(), 2);

        assert!(sim
            .send(&ControlCommand::point_turn(f64::NAN))
            .is_err());
    }

    #[test]
    fn test_noisy_pose_is_repeatable() {
        let params = SimParams {
            pos_noise_m: 0.05,
            yaw_noise_rad: 0.01,
            seed: 7,
            ..SimParams::default()
        };

        let (_a, pose_a, _) = SimRover::new(params.clone(), 0.05).unwrap();
        let (_b, pose_b, _) = SimRover::new(params, 0.05).unwrap();

        let a = pose_a.latest_value().unwrap();
        assert_eq!(Some(a), pose_b.latest_value());
        assert!(a.x_m.abs() <= 0.05);
    }

    #[test]
    fn test_delayed_pose() {
        let params = SimParams {
            pose_start_tick: 10,
            ..SimParams::default()
        };
        let ctrl_params = CtrlParams {
            realtime: false,
            ..Default::default()
        };
        let (_sim, mut exec) = SimRover::with_exec(params, ctrl_params, || Interrupt::Fine).unwrap();

        // Pose arrives after 10 stopped ticks, well inside the timeout
        let reference = Pose2D::new(0.0, 0.0, -FRAC_PI_2);
        let mut lock = AngleLock::new(&HomingParams::default(), CameraMode::Sim, &reference, 0.0);
        assert!(exec.run(&mut lock).unwrap().is_complete());
    }

    #[test]
    fn test_pose_never_arrives() {
        let params = SimParams {
            pose_start_tick: u64::MAX,
            ..SimParams::default()
        };
        let ctrl_params = CtrlParams {
            realtime: false,
            pose_timeout_s: 0.5,
            ..Default::default()
        };
        let (sim, mut exec) = SimRover::with_exec(params, ctrl_params, || Interrupt::Fine).unwrap();

        struct NeedsPose;
        impl Phase for NeedsPose {
            type Outcome = ();
            fn name(&self) -> &'static str {
                "NeedsPose"
            }
            fn needs_pose(&self) -> bool {
                true
            }
            fn step(&mut self, _input: &mut TickInput) -> Step<()> {
                Step::Continue(ControlCommand::straight(1.0))
            }
        }

        assert!(matches!(
            exec.run(&mut NeedsPose),
            Err(PhaseError::PoseTimeout { .. })
        ));

        // Held still while waiting
        assert_eq!(sim.commands().len(), 10);
        assert!(sim.commands().iter().all(|c| c.is_stop()));
    }
}
