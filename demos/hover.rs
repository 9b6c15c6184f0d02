//! Levels a simulated quad-copter that starts out tilted.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_flight_attitude::{
    Config, FlightController, FlightMode, ImuReading, InertialSensor, MotorCommand, Scheduler,
    Setpoint, ESC,
};
use nalgebra::Vector3;
use std_embedded_time::StandardClock;

/// Angular acceleration (deg/s^2) per unit of differential thrust.
const TORQUE_GAIN: f32 = 400.;

const DAMPING: f32 = 0.995;

/// Roll and pitch dynamics of the simulated airframe.
struct Vehicle {
    /// Roll and pitch in degrees.
    angle: [f32; 2],

    /// Roll and pitch rates in deg/s.
    rate: [f32; 2],

    command: MotorCommand,
}

impl Vehicle {
    fn step(&mut self, dt: f32) {
        let [m1, m2, m3, m4] = self.command.0;
        let torque = [(m1 + m4) - (m2 + m3), (m1 + m2) - (m3 + m4)];

        for axis in 0..2 {
            self.rate[axis] = (self.rate[axis] + torque[axis] * TORQUE_GAIN * dt) * DAMPING;
            self.angle[axis] += self.rate[axis] * dt;
        }
    }

    fn reading(&self) -> ImuReading {
        let [roll, pitch] = self.angle.map(f32::to_radians);
        let accel = Vector3::new(
            -pitch.sin(),
            roll.sin() * pitch.cos(),
            roll.cos() * pitch.cos(),
        );
        let gyro = Vector3::new(self.rate[0], self.rate[1], 0.);
        ImuReading::new(accel, gyro)
    }
}

struct SimImu {
    vehicle: Rc<RefCell<Vehicle>>,
    dt: f32,
}

impl InertialSensor for SimImu {
    type Error = ();

    fn read_scaled(&mut self) -> Result<ImuReading, ()> {
        let mut vehicle = self.vehicle.borrow_mut();
        vehicle.step(self.dt);
        Ok(vehicle.reading())
    }

    fn calibrate(&mut self, _sample_count: u16) -> Result<(), ()> {
        Ok(())
    }
}

struct SimEsc {
    vehicle: Rc<RefCell<Vehicle>>,
    is_armed: bool,
}

impl ESC for SimEsc {
    fn arm(&mut self) {
        self.is_armed = true;
    }

    fn disarm(&mut self) {
        self.is_armed = false;
        self.vehicle.borrow_mut().command = MotorCommand::ZERO;
    }

    fn emergency_stop(&mut self) {
        self.disarm();
    }

    fn set_output(&mut self, command: MotorCommand) {
        if self.is_armed {
            self.vehicle.borrow_mut().command = command;
        }
    }
}

fn main() {
    let config = Config::default();

    let vehicle = Rc::new(RefCell::new(Vehicle {
        angle: [0.; 2],
        rate: [0.; 2],
        command: MotorCommand::ZERO,
    }));
    let imu = SimImu {
        vehicle: vehicle.clone(),
        dt: config.control_period,
    };
    let esc = SimEsc {
        vehicle: vehicle.clone(),
        is_armed: false,
    };

    let mut controller = match FlightController::new(imu, esc, config) {
        Ok(controller) => controller,
        Err(error) => {
            eprintln!("{}", error);
            return;
        }
    };

    if let Err(error) = controller.calibrate() {
        eprintln!("{}", error);
        return;
    }

    // Knock the vehicle over before take-off
    vehicle.borrow_mut().angle = [10., -5.];

    let started = controller
        .arm()
        .and_then(|()| controller.select_mode(FlightMode::Stabilize));
    if let Err(error) = started {
        eprintln!("{}", error);
        return;
    }
    controller.set_setpoint(Setpoint::new(0., 0., 0., 0.5));

    let mut scheduler = Scheduler::new(StandardClock::default(), config.loop_rate_hz());
    let ticks = 2 * config.loop_rate_hz();

    loop {
        let tick = match scheduler.poll() {
            Ok(Some(tick)) => tick,
            Ok(None) => continue,
            Err(error) => {
                eprintln!("{}", error);
                return;
            }
        };
        if tick.index >= ticks {
            break;
        }

        match controller.update() {
            Ok(command) if tick.index % 100 == 0 => {
                let attitude = controller.attitude();
                println!(
                    "{:>5} roll: {:>7.2} pitch: {:>7.2} motors: {:.2?}",
                    tick.index, attitude.roll, attitude.pitch, command.0
                );
            }
            Ok(_) => {}
            Err(error) => {
                eprintln!("{}", error);
                break;
            }
        }
    }

    controller.disarm();
    println!(
        "{} overruns, final attitude: {:?}",
        scheduler.overruns(),
        controller.attitude()
    );
}
