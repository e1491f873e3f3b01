//! Utility library for the navigation control software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;
