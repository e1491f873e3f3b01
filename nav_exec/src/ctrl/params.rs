//! Control executive parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;
use util::time::RateError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the control executive, shared by every phase it runs.
#[derive(Deserialize, Debug, Clone)]
pub struct CtrlParams {
    /// Tick frequency of the control loop
    pub frequency_hz: f64,

    /// If false the loop runs as fast as possible while still reporting the nominal tick period
    /// to the phases. Used when running against the simulator.
    pub realtime: bool,

    /// Maximum time a phase which needs a pose will wait for one before failing
    pub pose_timeout_s: f64,

    /// Detections older than this are treated as no detection
    pub max_observation_age_s: f64,
}

#[derive(Debug, Error)]
pub enum CtrlParamsError {
    #[error("The control frequency must be positive and finite, found {0} Hz")]
    InvalidFrequency(f64),

    #[error("Could not build the tick rate: {0}")]
    Rate(#[from] RateError),

    #[error("The pose timeout must be positive and finite, found {0} s")]
    InvalidPoseTimeout(f64),

    #[error("The maximum observation age must be positive and finite, found {0} s")]
    InvalidObservationAge(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CtrlParams {
    /// Check the parameters describe a loop that can actually be run.
    pub fn validate(&self) -> Result<(), CtrlParamsError> {
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(CtrlParamsError::InvalidFrequency(self.frequency_hz));
        }
        if !(self.pose_timeout_s.is_finite() && self.pose_timeout_s > 0.0) {
            return Err(CtrlParamsError::InvalidPoseTimeout(self.pose_timeout_s));
        }
        if !(self.max_observation_age_s.is_finite() && self.max_observation_age_s > 0.0) {
            return Err(CtrlParamsError::InvalidObservationAge(
                self.max_observation_age_s,
            ));
        }
        Ok(())
    }
}

impl Default for CtrlParams {
    fn default() -> Self {
        Self {
            frequency_hz: 20.0,
            realtime: true,
            pose_timeout_s: 5.0,
            max_observation_age_s: 0.5,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(CtrlParams::default().validate().is_ok());

        let p = CtrlParams {
            frequency_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(CtrlParamsError::InvalidFrequency(_))
        ));

        let p = CtrlParams {
            pose_timeout_s: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(CtrlParamsError::InvalidPoseTimeout(_))
        ));

        let p = CtrlParams {
            max_observation_age_s: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(CtrlParamsError::InvalidObservationAge(_))
        ));
    }
}
