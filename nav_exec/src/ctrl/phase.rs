//! # Control phases
//!
//! A control phase is one closed loop behaviour (searching, aligning, approaching...) which is
//! stepped once per tick by [`super::CtrlExec`]. Phases own all of their control state, including
//! their regulators, which is created when the phase is built and dropped with it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use comms_if::{ctrl::ControlCommand, interrupt::Interrupt};

use crate::{
    homing::{
        AlignOutcome, AlignmentLoop, AngleLock, ApproachLoop, ApproachOutcome, HeadingSearch,
        LockOutcome, SearchOutcome,
    },
    iface::{FrameTransform, VisSink},
    loc::Pose2D,
    per::TargetObservation,
    waypoint::{FollowOutcome, WaypointFollower},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A closed loop behaviour stepped once per tick.
pub trait Phase {
    /// Result of the phase when it completes.
    type Outcome;

    /// Name of the phase, for logging.
    fn name(&self) -> &'static str;

    /// Returns true if the phase can't run without a pose estimate.
    fn needs_pose(&self) -> bool;

    /// Run one tick of the phase.
    fn step(&mut self, input: &mut TickInput) -> Step<Self::Outcome>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything a phase can read during one tick.
pub struct TickInput<'a> {
    /// Latest pose snapshot
    pub pose: Option<Pose2D>,

    /// Latest target observation from the active camera
    pub obs: TargetObservation,

    /// Nominal tick period in seconds
    pub dt_s: f64,

    /// Frame transform service
    pub transform: &'a mut dyn FrameTransform,

    /// Debug visualiser
    pub vis: &'a mut dyn VisSink,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What a phase wants to happen after one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<O> {
    /// Send this command and keep running.
    Continue(ControlCommand),

    /// No pose is available; hold the robot still and wait.
    WaitPose,

    /// The phase is complete. The robot is stopped.
    Finished(O),
}

/// How a phase run ended, as reported to the mission layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseExit<O> {
    /// The phase ran to completion.
    Complete(O),

    /// The phase was aborted by the interrupt monitor. The robot was stopped before returning.
    Cancelled(Interrupt),
}

/// Every control phase, for callers which pick the phase at runtime.
pub enum ControlPhase {
    Search(HeadingSearch),
    Align(Box<AlignmentLoop>),
    Approach(ApproachLoop),
    AngleLock(AngleLock),
    // In a box to reduce the size of the phase enum
    Follow(Box<WaypointFollower>),
}

/// Outcome of any [`ControlPhase`].
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    Detected,
    Aligned { target_odom: Pose2D },
    Reached,
    EarlyEnd,
    Locked,
    PathComplete,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<O> Step<O> {
    /// Convert the outcome of a finished step.
    pub fn map<P, F: FnOnce(O) -> P>(self, f: F) -> Step<P> {
        match self {
            Step::Continue(c) => Step::Continue(c),
            Step::WaitPose => Step::WaitPose,
            Step::Finished(o) => Step::Finished(f(o)),
        }
    }
}

impl<O> PhaseExit<O> {
    /// Returns true if the phase completed, i.e. was not cancelled.
    pub fn is_complete(&self) -> bool {
        matches!(self, PhaseExit::Complete(_))
    }
}

impl Phase for ControlPhase {
    type Outcome = PhaseOutcome;

    fn name(&self) -> &'static str {
        match self {
            ControlPhase::Search(p) => p.name(),
            ControlPhase::Align(p) => p.name(),
            ControlPhase::Approach(p) => p.name(),
            ControlPhase::AngleLock(p) => p.name(),
            ControlPhase::Follow(p) => p.name(),
        }
    }

    fn needs_pose(&self) -> bool {
        match self {
            ControlPhase::Search(p) => p.needs_pose(),
            ControlPhase::Align(p) => p.needs_pose(),
            ControlPhase::Approach(p) => p.needs_pose(),
            ControlPhase::AngleLock(p) => p.needs_pose(),
            ControlPhase::Follow(p) => p.needs_pose(),
        }
    }

    fn step(&mut self, input: &mut TickInput) -> Step<PhaseOutcome> {
        match self {
            ControlPhase::Search(p) => p.step(input).map(|o| o.into()),
            ControlPhase::Align(p) => p.step(input).map(|o| o.into()),
            ControlPhase::Approach(p) => p.step(input).map(|o| o.into()),
            ControlPhase::AngleLock(p) => p.step(input).map(|o| o.into()),
            ControlPhase::Follow(p) => p.step(input).map(|o| o.into()),
        }
    }
}

impl Display for ControlPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ControlPhase::{}", self.name())
    }
}

impl From<SearchOutcome> for PhaseOutcome {
    fn from(o: SearchOutcome) -> Self {
        match o {
            SearchOutcome::Detected => PhaseOutcome::Detected,
        }
    }
}

impl From<AlignOutcome> for PhaseOutcome {
    fn from(o: AlignOutcome) -> Self {
        match o {
            AlignOutcome::Done { target_odom } => PhaseOutcome::Aligned { target_odom },
        }
    }
}

impl From<ApproachOutcome> for PhaseOutcome {
    fn from(o: ApproachOutcome) -> Self {
        match o {
            ApproachOutcome::Reached => PhaseOutcome::Reached,
            ApproachOutcome::EarlyEnd => PhaseOutcome::EarlyEnd,
        }
    }
}

impl From<LockOutcome> for PhaseOutcome {
    fn from(o: LockOutcome) -> Self {
        match o {
            LockOutcome::Locked => PhaseOutcome::Locked,
        }
    }
}

impl From<FollowOutcome> for PhaseOutcome {
    fn from(o: FollowOutcome) -> Self {
        match o {
            FollowOutcome::PathComplete => PhaseOutcome::PathComplete,
        }
    }
}
