//! # Control module
//!
//! Everything shared by the homing and waypoint behaviours: the [`Regulator`] PID controller, the
//! [`Phase`] abstraction each behaviour implements, and the [`CtrlExec`] which runs a phase at a
//! fixed tick rate against the robot's collaborators.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod exec;
mod params;
mod phase;
mod regulator;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub(crate) use exec::describe_obs;
pub use exec::{CtrlExec, PhaseError, TickRecord};
pub use params::{CtrlParams, CtrlParamsError};
pub use phase::*;
pub use regulator::*;
