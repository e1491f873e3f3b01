//! # Homing sequence
//!
//! Runs the homing phases in order for the mission layer: align with the target (searching for it
//! first), approach it, then optionally lock to a heading relative to it. A stage only runs if the
//! one before it completed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use serde::Serialize;

use super::{
    AlignOutcome, AlignStatus, AlignmentLoop, AngleLock, ApproachLoop, ApproachOutcome,
    HomingParams, LockOutcome,
};
use crate::{
    ctrl::{CtrlExec, PhaseError, PhaseExit},
    loc::Pose2D,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// What happened in each stage of a homing run.
#[derive(Debug, Clone, PartialEq)]
pub struct HomingReport {
    pub align: PhaseExit<AlignOutcome>,

    /// Alignment status on the final aligning tick
    pub align_status: AlignStatus,

    pub approach: Option<PhaseExit<ApproachOutcome>>,

    pub lock: Option<PhaseExit<LockOutcome>>,
}

/// Short summary of a homing run, for archiving.
#[derive(Debug, Clone, Serialize)]
pub struct HomingSummary {
    pub aligned: bool,
    pub target_odom: Option<Pose2D>,
    pub approach: Option<String>,
    pub locked: Option<bool>,
    pub align_status: AlignStatus,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HomingReport {
    /// Returns true if every stage that was asked for completed.
    pub fn is_complete(&self) -> bool {
        self.align.is_complete()
            && self.approach.as_ref().map_or(false, |a| a.is_complete())
            && self.lock.as_ref().map_or(true, |l| l.is_complete())
    }

    /// The target pose found during alignment, in odom.
    pub fn target_odom(&self) -> Option<Pose2D> {
        match self.align {
            PhaseExit::Complete(AlignOutcome::Done { target_odom }) => Some(target_odom),
            PhaseExit::Cancelled(_) => None,
        }
    }

    pub fn summary(&self) -> HomingSummary {
        HomingSummary {
            aligned: self.align.is_complete(),
            target_odom: self.target_odom(),
            approach: self.approach.as_ref().map(|a| format!("{:?}", a)),
            locked: self.lock.as_ref().map(|l| l.is_complete()),
            align_status: self.align_status,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run the homing sequence.
///
/// If `lock_offset_rad` is given the robot finishes by locking its heading to the target's
/// orientation plus that offset.
pub fn run_homing(
    exec: &mut CtrlExec,
    params: &HomingParams,
    lock_offset_rad: Option<f64>,
) -> Result<HomingReport, PhaseError> {
    let cam_mode = exec.target_mgr().cam_mode();

    info!("Homing with the {:?} camera", cam_mode);

    // ---- ALIGN ----

    let mut align = AlignmentLoop::new(params, cam_mode);
    let align_exit = exec.run(&mut align)?;

    let mut report = HomingReport {
        align: align_exit,
        align_status: align.status(),
        approach: None,
        lock: None,
    };

    let target_odom = match report.target_odom() {
        Some(t) => t,
        None => return Ok(report),
    };

    // ---- APPROACH ----

    let mut approach = ApproachLoop::new(params).with_last_known(align.last_observation());
    let approach_exit = exec.run(&mut approach)?;
    let approached = approach_exit.is_complete();
    report.approach = Some(approach_exit);

    if !approached {
        return Ok(report);
    }

    // ---- LOCK ----

    if let Some(offset) = lock_offset_rad {
        let mut lock = AngleLock::new(params, cam_mode, &target_odom, offset);
        report.lock = Some(exec.run(&mut lock)?);
    }

    info!("Homing finished, complete: {}", report.is_complete());

    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ctrl::CtrlParams,
        sim::{SimParams, SimRover},
    };
    use comms_if::interrupt::Interrupt;
    use util::maths::wrap_angle;

    fn ctrl_params() -> CtrlParams {
        CtrlParams {
            realtime: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_homing() {
        let sim_params = SimParams {
            initial_pose: Pose2D::new(0.0, 0.0, -1.0),
            ..SimParams::default()
        };
        let (sim, mut exec) =
            SimRover::with_exec(sim_params, ctrl_params(), || Interrupt::Fine).unwrap();

        let report = run_homing(&mut exec, &HomingParams::default(), Some(0.5)).unwrap();

        assert!(report.is_complete());
        assert_eq!(
            report.approach,
            Some(PhaseExit::Complete(ApproachOutcome::Reached))
        );
        assert_eq!(report.lock, Some(PhaseExit::Complete(LockOutcome::Locked)));

        // Closer to the tag than it started, and locked to the requested heading
        let tag = SimParams::default().tag_pose;
        let pose = sim.pose();
        assert!(pose.distance_to(&tag) < 1.0);
        assert!(wrap_angle(pose.yaw_rad - 0.5).abs() < 0.1);
        assert!(sim.last_command().unwrap().is_stop());

        let summary = report.summary();
        assert!(summary.aligned);
        assert_eq!(summary.locked, Some(true));
    }

    #[test]
    fn test_cancelled_homing_stops_early() {
        let sim_params = SimParams {
            max_range_m: 0.1,
            ..SimParams::default()
        };

        let mut n = 0;
        let monitor = move || {
            n += 1;
            if n > 50 {
                Interrupt::Overcurrent
            }
            else {
                Interrupt::Fine
            }
        };

        let (_sim, mut exec) = SimRover::with_exec(sim_params, ctrl_params(), monitor).unwrap();
        let report = run_homing(&mut exec, &HomingParams::default(), Some(0.5)).unwrap();

        assert_eq!(report.align, PhaseExit::Cancelled(Interrupt::Overcurrent));
        assert!(report.approach.is_none());
        assert!(report.lock.is_none());
        assert!(!report.is_complete());
        assert!(report.target_odom().is_none());
    }
}
