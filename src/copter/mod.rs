//! Attitude stabilized quad-copter.
//!
//! Every control tick the [`FlightController`] reads the IMU, advances the [`AttitudeEstimator`],
//! runs one PID per axis on the difference between the [`Setpoint`] and the estimated attitude
//! and mixes the outputs into the four motors.

use log::{error, info, warn};
use nalgebra::Vector3;

mod mode;
pub use mode::{Command, FlightMode};

use crate::config::{AxisGains, Config};
use crate::error::Error;
use crate::estimator::{Attitude, AttitudeEstimator};
use crate::hal::{InertialSensor, ESC};
use crate::motor::{MotorCommand, QuadMixer};
use crate::pid::PidController;

/// Wrap an angle in degrees to (-180, 180].
pub fn wrap_180(degrees: f32) -> f32 {
    let wrapped = degrees % 360.;
    if wrapped > 180. {
        wrapped - 360.
    } else if wrapped <= -180. {
        wrapped + 360.
    } else {
        wrapped
    }
}

/// Desired attitude in degrees and collective throttle in 0 ~ 1.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Setpoint {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub throttle: f32,
}

impl Setpoint {
    pub fn new(roll: f32, pitch: f32, yaw: f32, throttle: f32) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            throttle,
        }
    }

    /// Limit roll and pitch to ±`max_angle`, wrap yaw and limit throttle to 0 ~ 1.
    pub fn limited(self, max_angle: f32) -> Self {
        Self {
            roll: self.roll.max(-max_angle).min(max_angle),
            pitch: self.pitch.max(-max_angle).min(max_angle),
            yaw: wrap_180(self.yaw),
            throttle: self.throttle.max(0.).min(1.),
        }
    }
}

/// Quad-copter flight controller.
///
/// Owns the inertial sensor `S`, the motor ESCs `E`, the attitude estimator and a PID
/// controller per axis. [`update`](Self::update) must be called once every
/// [`Config::control_period`].
pub struct FlightController<S, E> {
    imu: S,
    esc: E,
    config: Config,
    estimator: AttitudeEstimator,
    roll: PidController,
    pitch: PidController,
    yaw: PidController,
    mixer: QuadMixer,
    mode: FlightMode,
    setpoint: Setpoint,
    attitude: Attitude,
    output: MotorCommand,
    sensor_failures: u32,
    is_calibrated: bool,
}

impl<S, E> FlightController<S, E>
where
    S: InertialSensor,
    E: ESC,
{
    /// Create a disarmed, uncalibrated controller.
    pub fn new(imu: S, mut esc: E, config: Config) -> Result<Self, Error<S::Error>> {
        config.validate()?;
        esc.disarm();

        Ok(Self {
            imu,
            esc,
            estimator: AttitudeEstimator::new(config.filter_alpha),
            roll: config.pid(config.roll),
            pitch: config.pid(config.pitch),
            yaw: config.pid(config.yaw),
            mixer: QuadMixer::default(),
            mode: FlightMode::Disarmed,
            setpoint: Setpoint::default(),
            attitude: Attitude::default(),
            output: MotorCommand::ZERO,
            sensor_failures: 0,
            is_calibrated: false,
            config,
        })
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn setpoint(&self) -> Setpoint {
        self.setpoint
    }

    /// The attitude used by the last update.
    pub fn attitude(&self) -> Attitude {
        self.attitude
    }

    /// The motor command dispatched by the last update.
    pub fn output(&self) -> MotorCommand {
        self.output
    }

    pub fn estimator(&self) -> &AttitudeEstimator {
        &self.estimator
    }

    pub fn roll_pid(&self) -> &PidController {
        &self.roll
    }

    pub fn pitch_pid(&self) -> &PidController {
        &self.pitch
    }

    pub fn yaw_pid(&self) -> &PidController {
        &self.yaw
    }

    /// Number of failed sensor reads since the last good one.
    pub fn sensor_failures(&self) -> u32 {
        self.sensor_failures
    }

    pub fn is_calibrated(&self) -> bool {
        self.is_calibrated
    }

    pub fn imu(&self) -> &S {
        &self.imu
    }

    pub fn imu_mut(&mut self) -> &mut S {
        &mut self.imu
    }

    pub fn esc(&self) -> &E {
        &self.esc
    }

    pub fn esc_mut(&mut self) -> &mut E {
        &mut self.esc
    }

    /// Set the target attitude and throttle, see [`Setpoint::limited`].
    pub fn set_setpoint(&mut self, setpoint: Setpoint) {
        self.setpoint = setpoint.limited(self.config.max_angle);
    }

    /// Replace the gains of all three axes. The PID controllers are reset.
    pub fn set_gains(&mut self, roll: AxisGains, pitch: AxisGains, yaw: AxisGains) {
        self.config.roll = roll;
        self.config.pitch = pitch;
        self.config.yaw = yaw;

        self.roll.set_gains(roll.kp, roll.ki, roll.kd);
        self.pitch.set_gains(pitch.kp, pitch.ki, pitch.kd);
        self.yaw.set_gains(yaw.kp, yaw.ki, yaw.kd);
    }

    /// Apply a [`Command`] and return the new flight mode.
    pub fn command(&mut self, command: Command) -> Result<FlightMode, Error<S::Error>> {
        match command {
            Command::Arm => self.arm()?,
            Command::Disarm => self.disarm(),
            Command::EmergencyStop => self.emergency_stop(),
            Command::Calibrate => self.calibrate()?,
            Command::SelectMode(mode) => self.select_mode(mode)?,
        }
        Ok(self.mode)
    }

    /// Calibrate the sensor and measure the gyro bias. The vehicle must be stationary.
    ///
    /// The sensor calibration is retried up to [`Config::init_retries`] times.
    /// On failure the controller stays uncalibrated and can't be armed.
    pub fn calibrate(&mut self) -> Result<(), Error<S::Error>> {
        self.transition(Command::Calibrate)?;
        self.is_calibrated = false;

        let sample_count = self.config.calibration_samples;
        let mut retries = 0;
        while let Err(error) = self.imu.calibrate(sample_count) {
            if retries >= self.config.init_retries {
                error!(
                    "sensor calibration failed after {} attempts",
                    u32::from(retries) + 1
                );
                return Err(Error::Sensor(error));
            }
            retries += 1;
            warn!("sensor calibration failed, retrying ({})", retries);
        }

        let mut read_error = None;
        let imu = &mut self.imu;
        let samples = (0..sample_count).map_while(|_| match imu.read_scaled() {
            Ok(reading) => Some(reading.gyro),
            Err(error) => {
                read_error = Some(error);
                None
            }
        });

        // Only commit the bias once every sample has been read
        let mut estimator = self.estimator.clone();
        let calibrated = estimator.calibrate_gyro(samples);
        if let Some(error) = read_error {
            error!("gyro calibration aborted, sensor read failed");
            return Err(Error::Sensor(error));
        }
        calibrated?;

        self.estimator = estimator;
        self.is_calibrated = true;

        let bias = self.estimator.gyro_bias();
        info!(
            "gyro calibrated from {} samples, bias: ({}, {}, {}) deg/s",
            sample_count, bias.x, bias.y, bias.z
        );

        Ok(())
    }

    /// Arm the motors. The gyro must be calibrated first.
    pub fn arm(&mut self) -> Result<(), Error<S::Error>> {
        let mode = self.transition(Command::Arm)?;
        if !self.is_calibrated {
            warn!("refusing to arm, gyro not calibrated");
            return Err(Error::NotCalibrated);
        }

        self.reset_pids();
        self.esc.arm();
        self.enter(mode);
        Ok(())
    }

    /// Switch to a flying mode, the motors must be armed.
    pub fn select_mode(&mut self, mode: FlightMode) -> Result<(), Error<S::Error>> {
        let mode = self.transition(Command::SelectMode(mode))?;
        self.enter(mode);
        Ok(())
    }

    pub fn disarm(&mut self) {
        self.esc.disarm();
        self.reset_pids();
        self.output = MotorCommand::ZERO;
        self.enter(FlightMode::Disarmed);
    }

    /// Cut the motors immediately, skipping the mixer, and disarm.
    pub fn emergency_stop(&mut self) {
        self.esc.emergency_stop();
        self.reset_pids();
        self.output = MotorCommand::ZERO;

        if self.mode != FlightMode::Disarmed {
            warn!("emergency stop while {:?}", self.mode);
        }
        self.enter(FlightMode::Disarmed);
    }

    /// Run one control tick and return the dispatched motor command.
    ///
    /// A failed sensor read reuses the last attitude. After
    /// [`Config::max_sensor_failures`] consecutive failures the controller performs an
    /// [`emergency_stop`](Self::emergency_stop) and returns [`Error::SensorFailSafe`].
    /// While disarmed a failed read is returned as [`Error::Sensor`].
    pub fn update(&mut self) -> Result<MotorCommand, Error<S::Error>> {
        let dt = self.config.control_period;

        match self.imu.read_scaled() {
            Ok(reading) => {
                self.sensor_failures = 0;
                self.estimator.update(reading.accel, reading.gyro, dt);
                self.attitude = self.estimator.attitude();
            }
            Err(error) if self.mode == FlightMode::Disarmed => {
                self.dispatch(MotorCommand::ZERO);
                return Err(Error::Sensor(error));
            }
            Err(error) => {
                self.sensor_failures = self.sensor_failures.saturating_add(1);
                if self.sensor_failures >= self.config.max_sensor_failures {
                    error!(
                        "{} consecutive sensor failures, disarming",
                        self.sensor_failures
                    );
                    self.emergency_stop();
                    return Err(Error::SensorFailSafe(error));
                }
                warn!(
                    "sensor read failed ({}/{}), holding last attitude",
                    self.sensor_failures, self.config.max_sensor_failures
                );
            }
        }

        let setpoint = self.setpoint;
        let attitude = self.attitude;
        let rpy = Vector3::new(
            self.roll.update(setpoint.roll - attitude.roll, dt),
            self.pitch.update(setpoint.pitch - attitude.pitch, dt),
            self.yaw.update(wrap_180(setpoint.yaw - attitude.yaw), dt),
        );

        let command = if self.mode == FlightMode::Disarmed {
            MotorCommand::ZERO
        } else {
            self.mixer.mix(rpy, setpoint.throttle)
        };

        self.dispatch(command);
        Ok(command)
    }

    fn dispatch(&mut self, command: MotorCommand) {
        self.esc.set_output(command);
        self.output = command;
    }

    fn reset_pids(&mut self) {
        self.roll.reset();
        self.pitch.reset();
        self.yaw.reset();
    }

    /// The mode after `command`, or the error for a rejected transition.
    fn transition(&self, command: Command) -> Result<FlightMode, Error<S::Error>> {
        self.mode.next(command).ok_or_else(|| {
            warn!("rejected {:?} while {:?}", command, self.mode);
            Error::InvalidTransition {
                from: self.mode,
                command,
            }
        })
    }

    fn enter(&mut self, mode: FlightMode) {
        if mode != self.mode {
            info!("flight mode: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}
