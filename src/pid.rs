use crate::filter::{alpha, LowPassFilter};

pub const DEFAULT_OUTPUT_LIMIT: f32 = 1.;
pub const DEFAULT_INTEGRAL_LIMIT: f32 = 0.5;

/// Lower is more filtering of the derivative term.
pub const DEFAULT_DERIVATIVE_FILTER_ALPHA: f32 = 0.1;

/// Proportional, integral and derivative gains.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Gains {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// Single axis PID controller with a clamped integrator, output saturation
/// and a low-pass filtered derivative.
///
/// The integrator is frozen while the output is saturated and the error keeps pushing
/// further into saturation.
///
/// ```
/// use embedded_flight_attitude::PidController;
///
/// let mut pid = PidController::new(1., 0.1, 0.05);
/// pid.set_limits(0.5, 0.25);
///
/// assert_eq!(pid.update(2., 0.1), 0.5);
/// assert_eq!(pid.update(-2., 0.1), -0.5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PidController {
    gains: Gains,
    output_limit: f32,
    integral_limit: f32,
    integral: f32,
    prev_error: f32,
    prev_measurement: f32,
    derivative: LowPassFilter<f32>,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self::with_gains(Gains::new(kp, ki, kd))
    }

    pub fn with_gains(gains: Gains) -> Self {
        Self {
            gains,
            output_limit: DEFAULT_OUTPUT_LIMIT,
            integral_limit: DEFAULT_INTEGRAL_LIMIT,
            integral: 0.,
            prev_error: 0.,
            prev_measurement: 0.,
            derivative: LowPassFilter::new(DEFAULT_DERIVATIVE_FILTER_ALPHA),
        }
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn output_limit(&self) -> f32 {
        self.output_limit
    }

    pub fn integral_limit(&self) -> f32 {
        self.integral_limit
    }

    /// The integral accumulator (sum of `error * dt`, before `ki`).
    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn prev_error(&self) -> f32 {
        self.prev_error
    }

    pub fn prev_measurement(&self) -> f32 {
        self.prev_measurement
    }

    /// The filtered derivative (before `kd`).
    pub fn derivative(&self) -> f32 {
        self.derivative.output()
    }

    pub fn derivative_filter_alpha(&self) -> f32 {
        self.derivative.alpha()
    }

    /// Calculate the output for `error` after `dt` seconds, with the derivative taken on the error.
    ///
    /// Returns 0 and leaves the state untouched if `dt` is not positive.
    pub fn update(&mut self, error: f32, dt: f32) -> f32 {
        if dt <= 0. {
            return 0.;
        }

        let d = self.gains.kd * self.derivative.apply((error - self.prev_error) / dt);
        let output = self.output(error, d, dt);

        self.prev_error = error;
        output
    }

    /// Calculate the output for `setpoint - measurement` after `dt` seconds,
    /// with the derivative taken on the measurement.
    ///
    /// A step in `setpoint` does not produce a derivative kick.
    /// Returns 0 and leaves the state untouched if `dt` is not positive.
    pub fn update_on_measurement(&mut self, setpoint: f32, measurement: f32, dt: f32) -> f32 {
        if dt <= 0. {
            return 0.;
        }

        let error = setpoint - measurement;
        let d = -self.gains.kd
            * self
                .derivative
                .apply((measurement - self.prev_measurement) / dt);
        let output = self.output(error, d, dt);

        self.prev_measurement = measurement;
        output
    }

    /// Advance the integrator (unless saturated in the direction of `error`) and return the
    /// clamped sum of the P, I and D terms.
    fn output(&mut self, error: f32, d: f32, dt: f32) -> f32 {
        let p = self.gains.kp * error;

        let unclamped = p + self.gains.ki * self.integral + d;
        let winding_up = (unclamped >= self.output_limit && error > 0.)
            || (unclamped <= -self.output_limit && error < 0.);
        if !winding_up {
            self.integral = (self.integral + error * dt)
                .max(-self.integral_limit)
                .min(self.integral_limit);
        }

        (p + self.gains.ki * self.integral + d)
            .max(-self.output_limit)
            .min(self.output_limit)
    }

    /// Clear the integrator, derivative filter and stored error/measurement.
    /// Gains and limits are kept.
    pub fn reset(&mut self) {
        self.integral = 0.;
        self.prev_error = 0.;
        self.prev_measurement = 0.;
        self.derivative.reset(0.);
    }

    /// Replace the gains and [`reset`](Self::reset) the controller, an integral accumulated
    /// under the old gains would cause a transient.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.gains = Gains::new(kp, ki, kd);
        self.reset();
    }

    /// Change the output and integral bounds, the state is kept.
    pub fn set_limits(&mut self, output_limit: f32, integral_limit: f32) {
        self.output_limit = output_limit;
        self.integral_limit = integral_limit;
    }

    pub fn set_derivative_filter_alpha(&mut self, alpha: f32) {
        self.derivative.set_alpha(alpha);
    }

    /// Set the derivative filter from a cutoff frequency (in hz) for updates every `dt` seconds.
    pub fn set_derivative_cutoff(&mut self, cutoff_hz: f32, dt: f32) {
        self.derivative.set_alpha(alpha(dt, cutoff_hz));
    }
}
