use core::fmt;

use crate::copter::{Command, FlightMode};

/// An argument or configuration value outside of its valid range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidArgument(pub &'static str);

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid argument: {}", self.0)
    }
}

/// Errors reported by the [`FlightController`](crate::FlightController).
///
/// `E` is the error type of the inertial sensor driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    InvalidArgument(InvalidArgument),

    /// The command is not allowed in the current flight mode, nothing was changed.
    InvalidTransition { from: FlightMode, command: Command },

    /// Arming requires a successful gyro calibration first.
    NotCalibrated,

    /// The inertial sensor failed to produce a reading.
    Sensor(E),

    /// Too many consecutive sensor failures, the controller has been disarmed.
    SensorFailSafe(E),
}

impl<E> From<InvalidArgument> for Error<E> {
    fn from(error: InvalidArgument) -> Self {
        Error::InvalidArgument(error)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(error) => error.fmt(f),
            Error::InvalidTransition { from, command } => {
                write!(f, "cannot {:?} while {:?}", command, from)
            }
            Error::NotCalibrated => f.write_str("gyro not calibrated"),
            Error::Sensor(error) => write!(f, "sensor read failed: {:?}", error),
            Error::SensorFailSafe(error) => {
                write!(f, "sensor fail-safe triggered, disarmed: {:?}", error)
            }
        }
    }
}
