//! # Heading search
//!
//! Turn on the spot until the target comes into view.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlCommand;
use log::info;

use super::HomingParams;
use crate::{
    ctrl::{describe_obs, Phase, Step, TickInput},
    per::CameraMode,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Spins the robot at a constant rate until any observation of the target is made.
///
/// There is no timeout, the search runs until it finds something or is cancelled.
#[derive(Debug, Clone)]
pub struct HeadingSearch {
    rate_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchOutcome {
    Detected,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HeadingSearch {
    pub fn new(rate_rads: f64) -> Self {
        Self { rate_rads }
    }

    /// Search at the rate suited to the given camera.
    pub fn from_params(params: &HomingParams, cam_mode: CameraMode) -> Self {
        Self::new(params.search_rate(cam_mode))
    }
}

impl Phase for HeadingSearch {
    type Outcome = SearchOutcome;

    fn name(&self) -> &'static str {
        "HeadingSearch"
    }

    fn needs_pose(&self) -> bool {
        false
    }

    fn step(&mut self, input: &mut TickInput) -> Step<SearchOutcome> {
        if input.obs.is_some() {
            info!("Target found: {}", describe_obs(&input.obs));
            Step::Finished(SearchOutcome::Detected)
        }
        else {
            Step::Continue(ControlCommand::point_turn(self.rate_rads))
        }
    }
}
