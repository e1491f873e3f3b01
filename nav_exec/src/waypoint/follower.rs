//! # Waypoint follower
//!
//! Drives through a sequence of waypoints produced by a [`WaypointSource`], moving on to the next
//! one each time the controller reports the current one reached.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlCommand;
use log::{debug, info};

use super::{WaypointCtrl, WaypointParams};
use crate::{
    ctrl::{Phase, Step, TickInput},
    iface::{WaypointSource, ODOM_FRAME},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct WaypointFollower {
    ctrl: WaypointCtrl,

    source: Box<dyn WaypointSource>,

    /// Number of waypoints reached so far
    num_reached: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowOutcome {
    /// The source has no more waypoints.
    PathComplete,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WaypointFollower {
    pub fn new(params: WaypointParams, source: Box<dyn WaypointSource>) -> Self {
        Self {
            ctrl: WaypointCtrl::new(params),
            source,
            num_reached: 0,
        }
    }

    pub fn num_reached(&self) -> usize {
        self.num_reached
    }

    /// Move on to the next waypoint, returning false if there are none left.
    fn advance(&mut self) -> bool {
        match self.source.next_waypoint() {
            Some((x, y)) => {
                info!("Next waypoint ({:.2}, {:.2})", x, y);
                self.ctrl.set_target(x, y);
                true
            }
            None => false,
        }
    }
}

impl Phase for WaypointFollower {
    type Outcome = FollowOutcome;

    fn name(&self) -> &'static str {
        "WaypointFollower"
    }

    fn needs_pose(&self) -> bool {
        true
    }

    fn step(&mut self, input: &mut TickInput) -> Step<FollowOutcome> {
        let pose = match input.pose {
            Some(p) => p,
            None => return Step::WaitPose,
        };

        if self.ctrl.target().is_none() && !self.advance() {
            info!("No waypoints to follow");
            return Step::Finished(FollowOutcome::PathComplete);
        }

        let cmd = self.ctrl.compute(&pose, input.dt_s);

        if let Some(t) = self.ctrl.target() {
            if let Err(e) = input
                .vis
                .show_line("waypoint", ODOM_FRAME, (pose.x_m, pose.y_m), t)
            {
                debug!("Could not visualise the waypoint: {}", e);
            }
        }

        if self.ctrl.at_linear_target() {
            self.num_reached += 1;
            info!(
                "Waypoint {} reached at ({:.2}, {:.2})",
                self.num_reached, pose.x_m, pose.y_m
            );

            if !self.advance() {
                info!("Path complete, {} waypoints reached", self.num_reached);
                return Step::Finished(FollowOutcome::PathComplete);
            }

            return Step::Continue(ControlCommand::stop());
        }

        Step::Continue(cmd)
    }
}

impl std::fmt::Debug for WaypointFollower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaypointFollower")
            .field("ctrl", &self.ctrl)
            .field("num_reached", &self.num_reached)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ctrl::{ControlPhase, CtrlParams, PhaseExit, PhaseOutcome},
        loc::Pose2D,
        sim::{SimParams, SimRover},
    };
    use comms_if::interrupt::Interrupt;
    use std::collections::VecDeque;

    fn ctrl_params() -> CtrlParams {
        CtrlParams {
            frequency_hz: 60.0,
            realtime: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_follow_path() {
        let (sim, mut exec) =
            SimRover::with_exec(SimParams::default(), ctrl_params(), || Interrupt::Fine).unwrap();

        let path: VecDeque<(f64, f64)> = vec![(2.0, 1.5), (2.0, -1.0), (0.0, 0.0)].into();
        let mut follower = WaypointFollower::new(WaypointParams::default(), Box::new(path));

        assert_eq!(
            exec.run(&mut follower).unwrap(),
            PhaseExit::Complete(FollowOutcome::PathComplete)
        );
        assert_eq!(follower.num_reached(), 3);
        assert!(sim.pose().distance_to(&Pose2D::default()) < 0.1);
        assert!(sim.last_command().unwrap().is_stop());
    }

    #[test]
    fn test_empty_path() {
        let (sim, mut exec) =
            SimRover::with_exec(SimParams::default(), ctrl_params(), || Interrupt::Fine).unwrap();

        let mut phase = ControlPhase::Follow(Box::new(WaypointFollower::new(
            WaypointParams::default(),
            Box::new(VecDeque::new()),
        )));

        assert_eq!(
            exec.run(&mut phase).unwrap(),
            PhaseExit::Complete(PhaseOutcome::PathComplete)
        );
        assert_eq!(sim.commands().len(), 1);
    }
}
