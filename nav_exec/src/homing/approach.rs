//! # Approach loop
//!
//! Drives straight at a fixed speed towards the target until the camera reports it within the
//! proximity threshold. Short detection dropouts are bridged with the last known observation, a
//! long dropout ends the approach early.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlCommand;
use log::{debug, info, warn};

use super::HomingParams;
use crate::{
    ctrl::{describe_obs, Phase, Step, TickInput},
    per::TargetObservation,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ApproachLoop {
    threshold_m: f64,

    speed_ms: f64,

    max_misses: u32,

    /// Number of consecutive ticks without a detection
    num_misses: u32,

    /// Most recent observation of the target, in the camera frame
    last_known: TargetObservation,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachOutcome {
    /// The target is within the proximity threshold.
    Reached,

    /// The target was lost for too long. This is still a successful approach, the robot is
    /// assumed to be close enough that the camera can no longer see the target.
    EarlyEnd,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ApproachLoop {
    pub fn new(params: &HomingParams) -> Self {
        Self {
            threshold_m: params.approach_threshold_m,
            speed_ms: params.approach_speed(),
            max_misses: params.max_misses,
            num_misses: 0,
            last_known: TargetObservation::None,
        }
    }

    /// Start the approach from an earlier observation, for example the last one made while
    /// aligning.
    pub fn with_last_known(mut self, obs: TargetObservation) -> Self {
        self.last_known = obs;
        self
    }

    pub fn num_misses(&self) -> u32 {
        self.num_misses
    }
}

impl Phase for ApproachLoop {
    type Outcome = ApproachOutcome;

    fn name(&self) -> &'static str {
        "Approach"
    }

    fn needs_pose(&self) -> bool {
        false
    }

    fn step(&mut self, input: &mut TickInput) -> Step<ApproachOutcome> {
        if input.obs.is_some() {
            self.last_known = input.obs;
            self.num_misses = 0;
        }
        else {
            self.num_misses += 1;
            debug!("No detection for {} ticks", self.num_misses);
        }

        if self.num_misses >= self.max_misses {
            warn!(
                "Target lost for {} ticks, ending approach early",
                self.num_misses
            );
            return Step::Finished(ApproachOutcome::EarlyEnd);
        }

        let range_m = match self.last_known.range_m() {
            Some(r) => r,
            None => {
                debug!("Target never seen, holding");
                return Step::Continue(ControlCommand::stop());
            }
        };

        if range_m < self.threshold_m {
            info!(
                "Approach complete, target at {}",
                describe_obs(&self.last_known)
            );
            return Step::Finished(ApproachOutcome::Reached);
        }

        Step::Continue(ControlCommand::straight(self.speed_ms))
    }
}
