/// Flight modes of the [`FlightController`](super::FlightController).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlightMode {
    /// Motors are forced to zero. Initial state and the state entered on any fault.
    #[default]
    Disarmed,

    /// Motors are armed but no flight mode has been selected yet.
    Armed,

    /// Self-levelling attitude hold.
    Stabilize,

    /// Attitude hold, the altitude loop is not implemented.
    AltitudeHold,

    /// Attitude hold, the position loop is not implemented.
    PositionHold,
}

impl FlightMode {
    /// Returns `true` for the modes that fly the vehicle.
    pub fn is_flying(self) -> bool {
        matches!(
            self,
            FlightMode::Stabilize | FlightMode::AltitudeHold | FlightMode::PositionHold
        )
    }

    pub fn is_armed(self) -> bool {
        self != FlightMode::Disarmed
    }

    /// The mode after `command`, or `None` if the command is not allowed in this mode.
    ///
    /// ```
    /// use embedded_flight_attitude::{Command, FlightMode};
    ///
    /// assert_eq!(FlightMode::Disarmed.next(Command::Arm), Some(FlightMode::Armed));
    /// assert_eq!(
    ///     FlightMode::Disarmed.next(Command::SelectMode(FlightMode::Stabilize)),
    ///     None
    /// );
    /// ```
    pub fn next(self, command: Command) -> Option<FlightMode> {
        match (self, command) {
            (FlightMode::Disarmed, Command::Arm) => Some(FlightMode::Armed),
            (FlightMode::Disarmed, Command::Calibrate) => Some(FlightMode::Disarmed),
            (_, Command::Disarm) | (_, Command::EmergencyStop) => Some(FlightMode::Disarmed),
            (from, Command::SelectMode(to)) if from.is_armed() && to.is_flying() => Some(to),
            _ => None,
        }
    }
}

/// Requests that change the [`FlightMode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Arm,
    Disarm,
    EmergencyStop,

    /// Measure the gyro bias, only while disarmed.
    Calibrate,

    SelectMode(FlightMode),
}

#[cfg(test)]
mod tests {
    use super::{Command, FlightMode};

    const MODES: [FlightMode; 5] = [
        FlightMode::Disarmed,
        FlightMode::Armed,
        FlightMode::Stabilize,
        FlightMode::AltitudeHold,
        FlightMode::PositionHold,
    ];

    #[test]
    fn disarm_is_always_allowed() {
        for mode in MODES {
            assert_eq!(mode.next(Command::Disarm), Some(FlightMode::Disarmed));
            assert_eq!(mode.next(Command::EmergencyStop), Some(FlightMode::Disarmed));
        }
    }

    #[test]
    fn arm_and_calibrate_only_when_disarmed() {
        for mode in MODES.into_iter().skip(1) {
            assert_eq!(mode.next(Command::Arm), None);
            assert_eq!(mode.next(Command::Calibrate), None);
        }
        assert_eq!(
            FlightMode::Disarmed.next(Command::Calibrate),
            Some(FlightMode::Disarmed)
        );
    }

    #[test]
    fn flying_modes_need_arming() {
        let stabilize = Command::SelectMode(FlightMode::Stabilize);
        assert_eq!(FlightMode::Disarmed.next(stabilize), None);
        assert_eq!(FlightMode::Armed.next(stabilize), Some(FlightMode::Stabilize));

        let hold = Command::SelectMode(FlightMode::PositionHold);
        assert_eq!(
            FlightMode::AltitudeHold.next(hold),
            Some(FlightMode::PositionHold)
        );
    }

    #[test]
    fn it_rejects_selecting_ground_modes() {
        for mode in MODES {
            assert_eq!(mode.next(Command::SelectMode(FlightMode::Disarmed)), None);
            assert_eq!(mode.next(Command::SelectMode(FlightMode::Armed)), None);
        }
    }
}
