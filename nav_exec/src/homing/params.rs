//! Homing parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use crate::{
    ctrl::{Gains, Limits, Regulator},
    per::CameraMode,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the homing phases
#[derive(Deserialize, Debug, Clone)]
pub struct HomingParams {
    /// Turn rate while searching for the target
    pub search_rate_rads: f64,

    /// Turn rate while searching with the simulated camera
    pub search_rate_sim_rads: f64,

    /// Gains of the heading regulator, before output scaling
    pub angular_gains: Gains,

    /// Scale factor applied to the heading regulator output
    pub output_scale: f64,

    /// Maximum absolute turn rate demanded by any homing phase
    pub max_angular_rads: f64,

    /// Maximum absolute speed demanded by any homing phase
    pub max_linear_ms: f64,

    /// Heading error under which alignment is complete
    pub alignment_threshold_rad: f64,

    /// Distance from the target the robot should finish at. Only reported, never commanded.
    pub standoff_m: f64,

    /// Maximum time to wait for a detection to be transformed into the odometry frame
    pub transform_timeout_s: f64,

    /// Camera range to the target under which the approach is complete
    pub approach_threshold_m: f64,

    /// Speed to drive at while approaching. Negative speeds drive backwards, towards a target
    /// seen by a rear facing camera.
    pub approach_speed_ms: f64,

    /// Number of consecutive ticks without a detection after which the approach ends early
    pub max_misses: u32,
}

#[derive(Debug, Error)]
pub enum HomingParamsError {
    #[error("{0} must be positive and finite, found {1}")]
    NotPositive(&'static str, f64),

    #[error("{0} must be finite, found {1}")]
    NotFinite(&'static str, f64),

    #[error("max_misses must be at least 1")]
    NoMisses,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HomingParams {
    /// Check every value is usable by the homing phases.
    pub fn validate(&self) -> Result<(), HomingParamsError> {
        for (name, value) in [
            ("search_rate_rads", self.search_rate_rads),
            ("search_rate_sim_rads", self.search_rate_sim_rads),
            ("output_scale", self.output_scale),
            ("approach_speed_ms", self.approach_speed_ms),
            ("standoff_m", self.standoff_m),
        ] {
            if !value.is_finite() {
                return Err(HomingParamsError::NotFinite(name, value));
            }
        }

        for (name, value) in [
            ("max_angular_rads", self.max_angular_rads),
            ("max_linear_ms", self.max_linear_ms),
            ("alignment_threshold_rad", self.alignment_threshold_rad),
            ("transform_timeout_s", self.transform_timeout_s),
            ("approach_threshold_m", self.approach_threshold_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(HomingParamsError::NotPositive(name, value));
            }
        }

        if self.max_misses == 0 {
            return Err(HomingParamsError::NoMisses);
        }

        Ok(())
    }

    /// Search rate for the given camera, limited to the maximum turn rate.
    pub fn search_rate(&self, cam_mode: CameraMode) -> f64 {
        let rate = if cam_mode.is_sim() {
            self.search_rate_sim_rads
        }
        else {
            self.search_rate_rads
        };

        self.angular_limits().clamp(rate)
    }

    /// Approach speed, limited to the maximum speed.
    pub fn approach_speed(&self) -> f64 {
        self.linear_limits().clamp(self.approach_speed_ms)
    }

    pub fn angular_limits(&self) -> Limits {
        Limits::symmetric(self.max_angular_rads)
    }

    pub fn linear_limits(&self) -> Limits {
        Limits::symmetric(self.max_linear_ms)
    }

    /// Build a fresh heading regulator.
    pub fn heading_regulator(&self) -> Regulator {
        Regulator::new(
            self.angular_gains.scaled(self.output_scale),
            self.angular_limits(),
        )
    }
}

impl Default for HomingParams {
    fn default() -> Self {
        Self {
            search_rate_rads: 0.785398,
            search_rate_sim_rads: 0.392699,
            angular_gains: Gains::new(5.0, 0.0, 0.0),
            output_scale: 2.0,
            max_angular_rads: 1.0,
            max_linear_ms: 0.25,
            alignment_threshold_rad: 0.1,
            standoff_m: 0.8,
            transform_timeout_s: 1.0,
            approach_threshold_m: 0.6,
            approach_speed_ms: -0.2,
            max_misses: 6,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_commands_limited() {
        let params = HomingParams {
            search_rate_rads: 2.0,
            search_rate_sim_rads: -3.0,
            max_angular_rads: 1.0,
            approach_speed_ms: -3.0,
            ..HomingParams::default()
        };
        assert!(params.validate().is_ok());

        assert_eq!(params.search_rate(CameraMode::Front), 1.0);
        assert_eq!(params.search_rate(CameraMode::Sim), -1.0);
        assert_eq!(params.approach_speed(), -0.25);

        // Values already inside the limits pass through
        let params = HomingParams::default();
        assert_eq!(params.search_rate(CameraMode::Back), params.search_rate_rads);
        assert_eq!(params.approach_speed(), params.approach_speed_ms);
    }

    #[test]
    fn test_validate() {
        assert!(HomingParams::default().validate().is_ok());

        let p = HomingParams {
            transform_timeout_s: -1.0,
            ..HomingParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(HomingParamsError::NotPositive("transform_timeout_s", _))
        ));

        let p = HomingParams {
            approach_speed_ms: f64::INFINITY,
            ..HomingParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(HomingParamsError::NotFinite("approach_speed_ms", _))
        ));

        let p = HomingParams {
            max_misses: 0,
            ..HomingParams::default()
        };
        assert!(matches!(p.validate(), Err(HomingParamsError::NoMisses)));
    }
}
