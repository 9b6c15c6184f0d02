//! Quaternion helpers used by the attitude estimator.
//!
//! All quaternions are Hamilton quaternions with the scalar part in `w`
//! (`Quaternion::new(w, i, j, k)`). Functions that produce a rotation return
//! it normalized.

use nalgebra::{Quaternion, Vector3};
use num_traits::Float;

/// Dot products above this are treated as parallel and interpolated linearly.
pub const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// Scale `q` to unit length.
///
/// A quaternion with a (near) zero norm is returned untouched rather than
/// divided by zero.
pub fn normalize(q: Quaternion<f32>) -> Quaternion<f32> {
    let norm = q.norm();
    if norm > f32::EPSILON {
        q * (1. / norm)
    } else {
        q
    }
}

/// Advance `q` by the body angular velocity `rate` (in radians/second) over `dt` seconds.
///
/// Forward-Euler on the quaternion derivative `q_dot = ½ q ⊗ (0, ω)`, followed by
/// renormalization.
pub fn integrate(q: Quaternion<f32>, rate: Vector3<f32>, dt: f32) -> Quaternion<f32> {
    let q_dot = q * Quaternion::from_imag(rate) * 0.5;
    normalize(q + q_dot * dt)
}

/// Spherical linear interpolation from `from` (`t = 0`) to `to` (`t = 1`)
/// along the shorter arc.
///
/// ```
/// use embedded_flight_attitude::math::slerp;
/// use nalgebra::Quaternion;
/// use approx::assert_abs_diff_eq;
///
/// let level = Quaternion::new(1., 0., 0., 0.);
/// let rolled = Quaternion::new(0.70710678, 0.70710678, 0., 0.);
///
/// let half = slerp(level, rolled, 0.5);
/// assert_abs_diff_eq!(half, Quaternion::new(0.9238795, 0.3826834, 0., 0.), epsilon = 1e-5);
/// ```
pub fn slerp(from: Quaternion<f32>, to: Quaternion<f32>, t: f32) -> Quaternion<f32> {
    let mut cos_omega = from.dot(&to);

    // q and -q are the same rotation, take the short way round
    let to = if cos_omega < 0. {
        cos_omega = -cos_omega;
        -to
    } else {
        to
    };

    let (k0, k1) = if cos_omega > SLERP_LINEAR_THRESHOLD {
        (1. - t, t)
    } else {
        let omega = cos_omega.acos();
        let sin_omega = omega.sin();
        (
            ((1. - t) * omega).sin() / sin_omega,
            (t * omega).sin() / sin_omega,
        )
    };

    normalize(from * k0 + to * k1)
}
