use embedded_hal::PwmPin;

use super::PwmEsc;

pub struct Builder {
    min_pulse_ms: f32,
    max_pulse_ms: f32,
    pwm_freq_hz: f32,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            min_pulse_ms: 1.,
            max_pulse_ms: 2.,
            pwm_freq_hz: 400.,
        }
    }
}

impl Builder {
    /// Pulse width (in milliseconds) for zero throttle.
    pub fn min_pulse_ms(mut self, ms: f32) -> Self {
        self.min_pulse_ms = ms;
        self
    }

    /// Pulse width (in milliseconds) for full throttle.
    pub fn max_pulse_ms(mut self, ms: f32) -> Self {
        self.max_pulse_ms = ms;
        self
    }

    /// Frequency of the PWM signal the pins are configured for.
    pub fn pwm_freq_hz(mut self, hz: f32) -> Self {
        self.pwm_freq_hz = hz;
        self
    }

    pub fn build<P: PwmPin>(self, pins: [P; 4]) -> PwmEsc<P> {
        PwmEsc {
            pins,
            min_pulse_ms: self.min_pulse_ms,
            max_pulse_ms: self.max_pulse_ms,
            period_ms: 1000. / self.pwm_freq_hz,
            is_armed: false,
        }
    }
}
