//! # Simulated drive base
//!
//! Unicycle kinematics plus a seeded noise source for the published pose.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::ctrl::ControlCommand;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::loc::Pose2D;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Uniform noise generator with a fixed seed so simulated runs are repeatable.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    rng: StdRng,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NoiseGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform noise in `[-amplitude, amplitude]`.
    pub fn uniform(&mut self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-amplitude..=amplitude)
    }

    /// Add noise to each component of a pose.
    pub fn perturb(&mut self, pose: &Pose2D, pos_amplitude_m: f64, yaw_amplitude_rad: f64) -> Pose2D {
        Pose2D::new(
            pose.x_m + self.uniform(pos_amplitude_m),
            pose.y_m + self.uniform(pos_amplitude_m),
            pose.yaw_rad + self.uniform(yaw_amplitude_rad),
        )
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Move a unicycle robot under the given command for `dt_s` seconds.
///
/// The turn is applied before the translation, so a point turn never moves the robot's position.
pub fn integrate(pose: &Pose2D, cmd: &ControlCommand, dt_s: f64) -> Pose2D {
    let yaw_rad = pose.yaw_rad + cmd.angular_rads * dt_s;
    let dist_m = cmd.linear_ms * dt_s;

    Pose2D::new(
        pose.x_m + dist_m * yaw_rad.cos(),
        pose.y_m + dist_m * yaw_rad.sin(),
        yaw_rad,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_integrate() {
        let p = integrate(&Pose2D::default(), &ControlCommand::straight(1.0), 0.5);
        assert_relative_eq!(p.x_m, 0.5);
        assert_eq!(p.y_m, 0.0);

        let p = integrate(&p, &ControlCommand::point_turn(FRAC_PI_2), 1.0);
        assert_relative_eq!(p.x_m, 0.5);
        assert_relative_eq!(p.yaw_rad, FRAC_PI_2);

        let p = integrate(&p, &ControlCommand::straight(-2.0), 0.5);
        assert_relative_eq!(p.x_m, 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.y_m, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_deterministic_noise() {
        let mut a = NoiseGenerator::new(42);
        let mut b = NoiseGenerator::new(42);

        for _ in 0..100 {
            let n = a.uniform(0.1);
            assert_eq!(n, b.uniform(0.1));
            assert!(n.abs() <= 0.1);
        }
        assert_eq!(a.uniform(0.0), 0.0);
    }
}
