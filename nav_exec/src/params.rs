//! Navigation executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the navigation executable
#[derive(Deserialize, Debug, Clone)]
pub struct NavExecParams {
    /// True when running against the simulator
    pub is_sim: bool,

    /// Detection topics currently being published, used to pick the camera
    pub published_topics: Vec<String>,

    /// Abort the mission after this long
    pub mission_timeout_s: f64,

    /// Points to drive through in the waypoint mission, in odom
    pub waypoints: Vec<(f64, f64)>,
}

#[derive(Debug, Error)]
pub enum NavExecParamsError {
    #[error("The mission timeout must be positive, found {0} s")]
    InvalidMissionTimeout(f64),

    #[error("Waypoint {0} is not finite: {1:?}")]
    InvalidWaypoint(usize, (f64, f64)),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavExecParams {
    pub fn validate(&self) -> Result<(), NavExecParamsError> {
        // An infinite timeout is allowed and means the mission never times out
        if !(self.mission_timeout_s > 0.0) {
            return Err(NavExecParamsError::InvalidMissionTimeout(
                self.mission_timeout_s,
            ));
        }

        for (i, w) in self.waypoints.iter().enumerate() {
            if !(w.0.is_finite() && w.1.is_finite()) {
                return Err(NavExecParamsError::InvalidWaypoint(i, *w));
            }
        }

        Ok(())
    }
}
