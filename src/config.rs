use num_traits::Float;

use crate::error::InvalidArgument;
use crate::estimator::DEFAULT_FILTER_ALPHA;
use crate::pid::{
    Gains, PidController, DEFAULT_DERIVATIVE_FILTER_ALPHA, DEFAULT_INTEGRAL_LIMIT,
    DEFAULT_OUTPUT_LIMIT,
};

/// PID gains of a single axis.
pub type AxisGains = Gains;

/// Static configuration of the [`FlightController`](crate::FlightController).
///
/// Angles are in degrees and times in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    pub roll: AxisGains,
    pub pitch: AxisGains,
    pub yaw: AxisGains,

    /// Bound of each PID output.
    pub output_limit: f32,

    /// Bound of each PID integral accumulator.
    pub integral_limit: f32,

    /// Low-pass coefficient of the PID derivative terms (0 ~ 1).
    pub derivative_filter_alpha: f32,

    /// Duration of one control tick.
    pub control_period: f32,

    /// Weight of the gyro in the complementary filter (0 ~ 1).
    pub filter_alpha: f32,

    /// Largest roll or pitch setpoint accepted.
    pub max_angle: f32,

    /// Number of stationary gyro samples averaged into the bias.
    pub calibration_samples: u16,

    /// Consecutive failed sensor reads tolerated before the controller disarms.
    pub max_sensor_failures: u32,

    /// Extra attempts at the sensor calibration before giving up.
    pub init_retries: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roll: AxisGains::new(0.5, 0.2, 0.1),
            pitch: AxisGains::new(0.5, 0.2, 0.1),
            yaw: AxisGains::new(0.85, 0.15, 0.),
            output_limit: DEFAULT_OUTPUT_LIMIT,
            integral_limit: DEFAULT_INTEGRAL_LIMIT,
            derivative_filter_alpha: DEFAULT_DERIVATIVE_FILTER_ALPHA,
            control_period: 0.002,
            filter_alpha: DEFAULT_FILTER_ALPHA,
            max_angle: 45.,
            calibration_samples: 500,
            max_sensor_failures: 10,
            init_retries: 3,
        }
    }
}

impl Config {
    /// Control loop frequency in hz.
    pub fn loop_rate_hz(&self) -> u32 {
        (1. / self.control_period).round() as u32
    }

    pub fn validate(&self) -> Result<(), InvalidArgument> {
        if !self.control_period.is_finite() || self.control_period <= 0. {
            return Err(InvalidArgument("control period must be positive"));
        }
        if !is_unit(self.filter_alpha) {
            return Err(InvalidArgument("filter alpha must be in 0 ~ 1"));
        }
        if !is_unit(self.derivative_filter_alpha) {
            return Err(InvalidArgument("derivative filter alpha must be in 0 ~ 1"));
        }
        if !is_bound(self.output_limit) || !is_bound(self.integral_limit) {
            return Err(InvalidArgument("limits must not be negative"));
        }
        if !is_bound(self.max_angle) {
            return Err(InvalidArgument("max angle must not be negative"));
        }
        if self.calibration_samples == 0 {
            return Err(InvalidArgument("calibration needs at least one sample"));
        }

        let all_gains = [self.roll, self.pitch, self.yaw];
        if all_gains
            .iter()
            .any(|g| !(g.kp.is_finite() && g.ki.is_finite() && g.kd.is_finite()))
        {
            return Err(InvalidArgument("gains must be finite"));
        }

        Ok(())
    }

    /// A PID controller for `gains` with the configured limits and derivative filter.
    pub fn pid(&self, gains: AxisGains) -> PidController {
        let mut pid = PidController::with_gains(gains);
        pid.set_limits(self.output_limit, self.integral_limit);
        pid.set_derivative_filter_alpha(self.derivative_filter_alpha);
        pid
    }
}

fn is_unit(value: f32) -> bool {
    (0. ..=1.).contains(&value)
}

fn is_bound(value: f32) -> bool {
    value.is_finite() && value >= 0.
}
