//! # embedded-flight-attitude
//! A `#![no_std]` quad-copter attitude loop for embedded rust
//!
//! # Estimation
//! [`AttitudeEstimator`] is a quaternion complementary filter fusing the gyro and accelerometer
//! (see [`math`] for the quaternion integration and interpolation).
//!
//! # Control
//! [`PidController`] is a single axis controller with anti-windup and a filtered derivative.
//!
//! [`QuadMixer`] mixes the roll, pitch and yaw outputs into the motors of an X quad-copter.
//!
//! [`FlightController`] runs estimation, control and mixing every tick behind a
//! [`FlightMode`] state machine.
//!
//! # Generic components
//! [`scheduler`] reports fixed rate control ticks from an [`embedded_time::Clock`].
//!
//! [`hal`] contains the sensor and motor interfaces (see [`PwmEsc`] for RC ESCs on PWM pins).

#![no_std]

pub mod config;
pub use config::{AxisGains, Config};

pub mod copter;
pub use copter::{Command, FlightController, FlightMode, Setpoint};

pub mod error;
pub use error::{Error, InvalidArgument};

pub mod estimator;
pub use estimator::{Attitude, AttitudeEstimator};

pub mod filter;
pub use filter::LowPassFilter;

pub mod hal;
pub use hal::{ImuReading, InertialSensor, PwmEsc, ESC};

pub mod math;

pub mod motor;
pub use motor::{Motor, MotorCommand, QuadMixer};

pub mod pid;
pub use pid::{Gains, PidController};

pub mod scheduler;
pub use scheduler::{Scheduler, Tick};
