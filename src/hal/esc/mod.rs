mod pwm;
pub use pwm::{Builder, PwmEsc};

use crate::MotorCommand;

/// Electronic speed controllers for the four motors.
pub trait ESC {
    /// Arm the motors, outputs are ignored until this is called.
    fn arm(&mut self);

    /// Stop the motors and ignore outputs until armed again.
    fn disarm(&mut self);

    /// Cut the motors immediately and disarm.
    fn emergency_stop(&mut self);

    /// Output a thrust command in 0 ~ 1 to each motor. Does nothing while disarmed.
    fn set_output(&mut self, command: MotorCommand);
}

impl<T: ESC + ?Sized> ESC for &mut T {
    fn arm(&mut self) {
        (&mut **self).arm()
    }

    fn disarm(&mut self) {
        (&mut **self).disarm()
    }

    fn emergency_stop(&mut self) {
        (&mut **self).emergency_stop()
    }

    fn set_output(&mut self, command: MotorCommand) {
        (&mut **self).set_output(command)
    }
}
