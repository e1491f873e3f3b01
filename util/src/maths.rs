//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Wrap an angle into the range `(-pi, pi]`.
///
/// All angular errors used by the controllers pass through this function before use.
pub fn wrap_angle<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    let pi_t = T::PI();
    let tau_t = pi_t + pi_t;

    // pi - [0, 2pi) is (-pi, pi]
    let wrapped = pi_t - rem_euclid(pi_t - angle, tau_t);

    // Round off in rem_euclid can give back exactly 2pi
    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Get the signed shortest angular distance to travel from `from` to `to`, in `(-pi, pi]`.
pub fn ang_dist<T>(from: T, to: T) -> T
where
    T: Float + FloatConst
{
    wrap_angle(to - from)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    }
    else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(0f64), 0f64);
        assert_relative_eq!(wrap_angle(1f64), 1f64);
        assert_relative_eq!(wrap_angle(-1f64), -1f64);
        assert_relative_eq!(wrap_angle(TAU + 0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-TAU - 0.5), -0.5, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);

        // The upper bound is inclusive, the lower bound exclusive
        assert_relative_eq!(wrap_angle(PI), PI);
        assert_relative_eq!(wrap_angle(-PI), PI);
        assert_relative_eq!(wrap_angle(3.0 * PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_angle_range() {
        // Sweep a grid of angle pairs well outside the principal range
        let mut a = -20.0;
        while a < 20.0 {
            let mut b = -20.0;
            while b < 20.0 {
                let w = wrap_angle(a - b);
                assert!(w > -PI && w <= PI, "wrap({} - {}) = {}", a, b, w);
                b += 0.37;
            }
            a += 0.41;
        }
    }

    #[test]
    fn test_ang_dist() {
        assert_relative_eq!(ang_dist(1f64, 2f64), 1f64);
        assert_relative_eq!(ang_dist(2f64, 1f64), -1f64);
        assert_relative_eq!(ang_dist(0f64, TAU), 0f64, epsilon = 1e-12);
        assert_relative_eq!(ang_dist(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-12);
        assert_relative_eq!(ang_dist(-PI + 0.1, PI - 0.1), -0.2, epsilon = 1e-12);
    }

}
