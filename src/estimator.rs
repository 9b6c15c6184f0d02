//! Complementary-filter attitude estimation.
//!
//! The gyro is integrated every update and the result is pulled towards the tilt measured by
//! the accelerometer with a [`slerp`] of `1 - alpha`.

use nalgebra::{Quaternion, Vector3};
use num_traits::Float;

use crate::error::InvalidArgument;
use crate::math::{integrate, slerp};

/// Default weight of the gyro integration in the complementary filter.
pub const DEFAULT_FILTER_ALPHA: f32 = 0.96;

/// Accelerometer readings with a smaller magnitude (in g) are ignored.
pub const MIN_ACCEL_NORM: f32 = 1e-4;

/// Euler angles in degrees (ZYX convention).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attitude {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Attitude {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Convert a unit quaternion to Euler angles.
    ///
    /// Pitch saturates at ±90° when the quaternion is at (or numerically past) gimbal lock.
    pub fn from_quaternion(q: &Quaternion<f32>) -> Self {
        let (w, x, y, z) = (q.w, q.i, q.j, q.k);

        let sinr_cosp = 2. * (w * x + y * z);
        let cosr_cosp = 1. - 2. * (x * x + y * y);
        let roll = sinr_cosp.atan2(cosr_cosp).to_degrees();

        let sinp = 2. * (w * y - z * x);
        let pitch = if sinp.abs() >= 1. {
            90. * sinp.signum()
        } else {
            sinp.asin().to_degrees()
        };

        let siny_cosp = 2. * (w * z + x * y);
        let cosy_cosp = 1. - 2. * (y * y + z * z);
        let yaw = siny_cosp.atan2(cosy_cosp).to_degrees();

        Self::new(roll, pitch, yaw)
    }
}

/// Quaternion with the roll and pitch measured by the accelerometer and zero yaw.
///
/// Returns `None` when the acceleration is too small to carry a direction (free-fall).
pub fn tilt_from_accel(accel: Vector3<f32>) -> Option<Quaternion<f32>> {
    let norm = accel.norm();
    if norm < MIN_ACCEL_NORM {
        return None;
    }
    let a = accel / norm;

    let roll = a.y.atan2(a.z);
    let pitch = -a.x.asin();

    let (sr, cr) = (roll * 0.5).sin_cos();
    let (sp, cp) = (pitch * 0.5).sin_cos();

    Some(Quaternion::new(cr * cp, sr * cp, cr * sp, -sr * sp))
}

/// Quaternion complementary filter fusing gyro rates (deg/s) and accelerometer (g) samples.
///
/// Inputs must be finite, nothing is checked.
///
/// ```
/// use embedded_flight_attitude::AttitudeEstimator;
/// use nalgebra::Vector3;
///
/// let mut estimator = AttitudeEstimator::default();
/// estimator.update(Vector3::new(0., 0., 1.), Vector3::zeros(), 0.002);
///
/// let attitude = estimator.attitude();
/// assert!(attitude.roll.abs() < 0.1 && attitude.pitch.abs() < 0.1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AttitudeEstimator {
    orientation: Quaternion<f32>,
    gyro_bias: Vector3<f32>,
    filter_alpha: f32,
}

impl Default for AttitudeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_ALPHA)
    }
}

impl AttitudeEstimator {
    /// Create a level estimator with no gyro bias.
    /// `filter_alpha` is the weight given to the gyro (0 ~ 1).
    pub fn new(filter_alpha: f32) -> Self {
        Self {
            orientation: Quaternion::identity(),
            gyro_bias: Vector3::zeros(),
            filter_alpha,
        }
    }

    pub fn orientation(&self) -> Quaternion<f32> {
        self.orientation
    }

    pub fn gyro_bias(&self) -> Vector3<f32> {
        self.gyro_bias
    }

    pub fn filter_alpha(&self) -> f32 {
        self.filter_alpha
    }

    pub fn set_filter_alpha(&mut self, filter_alpha: f32) {
        self.filter_alpha = filter_alpha;
    }

    /// Store the mean of `samples` (deg/s) as the gyro bias.
    ///
    /// The vehicle must be stationary. The orientation is left untouched.
    /// An empty set of samples is rejected and the previous bias is kept.
    pub fn calibrate_gyro<I>(&mut self, samples: I) -> Result<(), InvalidArgument>
    where
        I: IntoIterator<Item = Vector3<f32>>,
    {
        let (sum, count) = samples
            .into_iter()
            .fold((Vector3::<f32>::zeros(), 0usize), |(sum, count), sample| {
                (sum + sample, count + 1)
            });

        if count == 0 {
            return Err(InvalidArgument("gyro calibration needs at least one sample"));
        }

        self.gyro_bias = sum / count as f32;
        Ok(())
    }

    /// Advance the estimate by `dt` seconds with an accelerometer reading in g
    /// and a gyro reading in deg/s.
    ///
    /// When the accelerometer magnitude is too small to be trusted only the gyro is used.
    pub fn update(&mut self, accel: Vector3<f32>, gyro: Vector3<f32>, dt: f32) {
        let rate = (gyro - self.gyro_bias).map(|deg| deg.to_radians());
        let predicted = integrate(self.orientation, rate, dt);

        self.orientation = match tilt_from_accel(accel) {
            Some(tilt) => slerp(predicted, tilt, 1. - self.filter_alpha),
            None => predicted,
        };
    }

    /// The current orientation as Euler angles in degrees.
    pub fn attitude(&self) -> Attitude {
        Attitude::from_quaternion(&self.orientation)
    }
}
