//! # Homing module
//!
//! Brings the robot to a fiducial target seen by one of its cameras. Homing is made up of four
//! phases, each runnable on its own by [`crate::ctrl::CtrlExec`]:
//!
//! - [`HeadingSearch`] - turn on the spot until the target is seen.
//! - [`AlignmentLoop`] - search, then turn until the heading matches the target's orientation.
//! - [`ApproachLoop`] - drive straight at the target until close enough, tolerating dropouts.
//! - [`AngleLock`] - turn to a heading relative to the target.
//!
//! [`run_homing`] strings these together for the mission layer.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod alignment;
mod angle_lock;
mod approach;
mod heading_search;
mod params;
mod sequence;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use alignment::{AlignOutcome, AlignStatus, AlignmentLoop};
pub use angle_lock::{AngleLock, LockOutcome};
pub use approach::{ApproachLoop, ApproachOutcome};
pub use heading_search::{HeadingSearch, SearchOutcome};
pub use params::{HomingParams, HomingParamsError};
pub use sequence::{run_homing, HomingReport, HomingSummary};
