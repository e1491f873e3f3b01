//! # Communications interface crate.
//!
//! Provides the data types exchanged between the control software and its collaborators:
//! localisation, perception, the actuation layer and the interrupt monitor.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Velocity commands sent to the actuation layer
pub mod ctrl;

/// Target observations produced by perception
pub mod detection;

/// Interrupt conditions reported by the fault monitor
pub mod interrupt;

/// Planar pose type
pub mod pose;
