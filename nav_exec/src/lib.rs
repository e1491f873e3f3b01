//! # Navigation control library
//!
//! Closed loop control for homing onto a fiducial target and driving through waypoints.
//!
//! Pose estimates and target detections arrive asynchronously through [`snapshot`] cells. The
//! [`ctrl::CtrlExec`] reads the latest of each once per tick, steps the active control phase and
//! sends one velocity command to the actuation layer.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod ctrl;
pub mod homing;
pub mod iface;
pub mod loc;
pub mod params;
pub mod per;
pub mod sim;
pub mod snapshot;
pub mod waypoint;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Log targets which emit a `Trace` record on every control tick.
pub const TICK_LOG_TARGETS: [&str; 2] = [
    "nav_lib::ctrl::exec",
    "nav_lib::waypoint::controller",
];
