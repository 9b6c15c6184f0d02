mod builder;

pub use builder::Builder;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::PwmPin;
use num_traits::{NumCast, ToPrimitive, Zero};

use super::ESC;
use crate::MotorCommand;

/// Time the ESCs need to register the full throttle pulse during calibration.
const CALIBRATION_MAX_MS: u16 = 5000;

/// Time the ESCs need to register the zero throttle pulse during calibration.
const CALIBRATION_MIN_MS: u16 = 2000;

/// Four RC ESCs driven by servo style pulses on PWM pins.
///
/// Throttle maps linearly onto the pulse width between the minimum and maximum pulse.
pub struct PwmEsc<P> {
    pins: [P; 4],
    min_pulse_ms: f32,
    max_pulse_ms: f32,
    period_ms: f32,
    is_armed: bool,
}

impl<P> PwmEsc<P>
where
    P: PwmPin,
    P::Duty: NumCast + Zero,
{
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn is_armed(&self) -> bool {
        self.is_armed
    }

    pub fn pins(&self) -> &[P; 4] {
        &self.pins
    }

    /// Teach the ESCs the throttle range by holding the maximum and then the minimum pulse.
    /// The ESCs are left disarmed.
    pub fn calibrate<D>(&mut self, delay: &mut D)
    where
        D: DelayMs<u16>,
    {
        for pin in &mut self.pins {
            pin.enable();
        }

        self.write_all(1.);
        delay.delay_ms(CALIBRATION_MAX_MS);

        self.write_all(0.);
        delay.delay_ms(CALIBRATION_MIN_MS);
    }

    fn write_all(&mut self, throttle: f32) {
        let fraction = self.duty_fraction(throttle);
        for pin in &mut self.pins {
            write_fraction(pin, fraction);
        }
    }

    /// Fraction of the PWM period that is high for a throttle in 0 ~ 1.
    fn duty_fraction(&self, throttle: f32) -> f32 {
        let throttle = throttle.max(0.).min(1.);
        let pulse_ms = self.min_pulse_ms + throttle * (self.max_pulse_ms - self.min_pulse_ms);
        pulse_ms / self.period_ms
    }

    fn stop(&mut self) {
        for pin in &mut self.pins {
            pin.set_duty(P::Duty::zero());
        }
        self.is_armed = false;
    }
}

fn write_fraction<P>(pin: &mut P, fraction: f32)
where
    P: PwmPin,
    P::Duty: NumCast,
{
    let duty = pin
        .get_max_duty()
        .to_f32()
        .and_then(|max| <P::Duty as NumCast>::from(fraction * max));

    if let Some(duty) = duty {
        pin.set_duty(duty);
    }
}

impl<P> ESC for PwmEsc<P>
where
    P: PwmPin,
    P::Duty: NumCast + Zero,
{
    fn arm(&mut self) {
        for pin in &mut self.pins {
            pin.enable();
        }
        self.write_all(0.);
        self.is_armed = true;
    }

    fn disarm(&mut self) {
        self.stop();
    }

    fn emergency_stop(&mut self) {
        self.stop();
    }

    fn set_output(&mut self, command: MotorCommand) {
        if !self.is_armed {
            return;
        }

        let fractions = command.0.map(|throttle| self.duty_fraction(throttle));
        for (pin, fraction) in self.pins.iter_mut().zip(fractions) {
            write_fraction(pin, fraction);
        }
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::blocking::delay::DelayMs;
    use embedded_hal::PwmPin;

    use super::PwmEsc;
    use crate::{MotorCommand, ESC};

    struct TestPin {
        duty: u16,
        enabled: bool,
    }

    impl PwmPin for TestPin {
        type Duty = u16;

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn get_duty(&self) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            62500
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    #[derive(Default)]
    struct TestDelay {
        total_ms: u32,
    }

    impl DelayMs<u16> for TestDelay {
        fn delay_ms(&mut self, ms: u16) {
            self.total_ms += ms as u32;
        }
    }

    fn esc() -> PwmEsc<TestPin> {
        let pins = [(); 4].map(|_| TestPin {
            duty: 0,
            enabled: false,
        });
        PwmEsc::<TestPin>::builder().build(pins)
    }

    fn duties(esc: &PwmEsc<TestPin>) -> [u16; 4] {
        [0, 1, 2, 3].map(|i| esc.pins()[i].get_duty())
    }

    #[test]
    fn outputs_are_ignored_until_armed() {
        let mut esc = esc();
        esc.set_output(MotorCommand([0.5; 4]));
        assert_eq!(duties(&esc), [0; 4]);
        assert!(!esc.is_armed());
    }

    #[test]
    fn arming_writes_min_pulse() {
        let mut esc = esc();
        esc.arm();

        assert!(esc.is_armed());
        assert!(esc.pins().iter().all(|pin| pin.enabled));
        // 1ms of a 2.5ms period
        assert_eq!(duties(&esc), [25000; 4]);
    }

    #[test]
    fn throttle_maps_to_pulse_width() {
        let mut esc = esc();
        esc.arm();
        esc.set_output(MotorCommand([0., 0.5, 1., 2.]));
        assert_eq!(duties(&esc), [25000, 37500, 50000, 50000]);
    }

    #[test]
    fn disarm_and_emergency_stop_cut_output() {
        let mut esc = esc();
        esc.arm();
        esc.set_output(MotorCommand([0.5; 4]));
        esc.disarm();
        assert_eq!(duties(&esc), [0; 4]);

        esc.set_output(MotorCommand([0.5; 4]));
        assert_eq!(duties(&esc), [0; 4]);

        esc.arm();
        esc.set_output(MotorCommand([0.5; 4]));
        esc.emergency_stop();
        assert_eq!(duties(&esc), [0; 4]);
        assert!(!esc.is_armed());
    }

    #[test]
    fn calibration_holds_max_then_min() {
        let mut esc = esc();
        let mut delay = TestDelay::default();
        esc.calibrate(&mut delay);

        assert_eq!(delay.total_ms, 7000);
        assert_eq!(duties(&esc), [25000; 4]);
        assert!(!esc.is_armed());
    }
}
