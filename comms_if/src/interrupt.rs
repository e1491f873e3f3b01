//! # Interrupt conditions

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Condition reported by the interrupt monitor.
///
/// Anything other than `Fine` aborts the active control phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interrupt {
    /// Nothing is wrong, carry on.
    Fine,

    /// The software is shutting down.
    Shutdown,

    /// The robot has been detected as stuck.
    Stuck,

    /// A drive or tool motor has exceeded its current limit.
    Overcurrent,

    /// The map has changed and the current plan is no longer valid.
    MapChange,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Interrupt {
    /// Returns true if the condition allows the active phase to continue.
    pub fn is_fine(&self) -> bool {
        matches!(self, Interrupt::Fine)
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Interrupt::Fine
    }
}

impl std::fmt::Display for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interrupt::Fine => write!(f, "Fine"),
            Interrupt::Shutdown => write!(f, "Shutdown"),
            Interrupt::Stuck => write!(f, "Stuck"),
            Interrupt::Overcurrent => write!(f, "Overcurrent"),
            Interrupt::MapChange => write!(f, "MapChange"),
        }
    }
}
