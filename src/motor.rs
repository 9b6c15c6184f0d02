use nalgebra::Vector3;

/// Normalized thrust commands for the four motors, each in 0 ~ 1.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorCommand(pub [f32; 4]);

impl MotorCommand {
    pub const ZERO: Self = Self([0.; 4]);

    /// Constrain every motor to 0 ~ 1.
    pub fn clamped(self) -> Self {
        Self(self.0.map(|m| m.max(0.).min(1.)))
    }
}

/// A single motor's contribution from roll, pitch and yaw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motor {
    pub factor: Vector3<f32>,
}

impl Motor {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            factor: Vector3::new(roll, pitch, yaw),
        }
    }

    /// Thrust for this motor given the roll, pitch and yaw outputs and the collective throttle.
    pub fn thrust(&self, rpy: Vector3<f32>, throttle: f32) -> f32 {
        self.factor
            .zip_fold(&rpy, throttle, |acc, factor, output| factor * output + acc)
    }
}

/// Motors of an X-configuration quad-copter:
/// front-left, front-right, rear-right and rear-left.
pub fn x_quad_motors() -> [Motor; 4] {
    [
        Motor::new(1., 1., 1.),
        Motor::new(-1., 1., -1.),
        Motor::new(-1., -1., 1.),
        Motor::new(1., -1., -1.),
    ]
}

/// Mixes throttle and roll/pitch/yaw controller outputs into motor commands.
///
/// ```
/// use embedded_flight_attitude::{MotorCommand, QuadMixer};
/// use nalgebra::Vector3;
///
/// let mixer = QuadMixer::default();
/// let command = mixer.mix(Vector3::new(0.1, 0., 0.), 0.5);
///
/// assert_eq!(command, MotorCommand([0.6, 0.4, 0.4, 0.6]));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct QuadMixer {
    pub motors: [Motor; 4],
}

impl Default for QuadMixer {
    fn default() -> Self {
        Self {
            motors: x_quad_motors(),
        }
    }
}

impl QuadMixer {
    /// Calculate the clamped motor commands for a throttle (0 ~ 1) and the roll, pitch and yaw outputs.
    pub fn mix(&self, rpy: Vector3<f32>, throttle: f32) -> MotorCommand {
        MotorCommand(self.motors.map(|motor| motor.thrust(rpy, throttle))).clamped()
    }
}
