//! # Waypoint module
//!
//! Heading-then-translate control towards fixed points in the odometry frame. [`WaypointCtrl`] is
//! the per-tick control law for a single target. [`WaypointFollower`] runs it as a phase over a
//! sequence of waypoints from the path planner.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod controller;
mod follower;
mod params;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use controller::{WaypointCtrl, WaypointReport};
pub use follower::{FollowOutcome, WaypointFollower};
pub use params::WaypointParams;
