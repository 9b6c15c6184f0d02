//! Interfaces to the sensor and motor drivers.

use nalgebra::Vector3;

pub mod esc;
pub use esc::{PwmEsc, ESC};

/// One scaled sample from the inertial sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImuReading {
    /// Acceleration in g.
    pub accel: Vector3<f32>,

    /// Angular rate in degrees/second.
    pub gyro: Vector3<f32>,
}

impl ImuReading {
    pub fn new(accel: Vector3<f32>, gyro: Vector3<f32>) -> Self {
        Self { accel, gyro }
    }
}

/// Accelerometer and gyroscope driver.
pub trait InertialSensor {
    /// Bus or device error.
    type Error;

    /// Read a sample with the driver's offsets removed.
    fn read_scaled(&mut self) -> Result<ImuReading, Self::Error>;

    /// Measure the driver side offsets from `sample_count` samples. The vehicle must be stationary.
    fn calibrate(&mut self, sample_count: u16) -> Result<(), Self::Error>;
}

impl<T> InertialSensor for &mut T
where
    T: InertialSensor + ?Sized,
{
    type Error = T::Error;

    fn read_scaled(&mut self) -> Result<ImuReading, Self::Error> {
        (&mut **self).read_scaled()
    }

    fn calibrate(&mut self, sample_count: u16) -> Result<(), Self::Error> {
        (&mut **self).calibrate(sample_count)
    }
}
