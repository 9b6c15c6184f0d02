use core::fmt;

use embedded_time::{clock, ConversionError};

/// Failure to read the current time from the scheduler's clock.
#[derive(Debug)]
pub enum Error {
    Clock(clock::Error),
    /// The clock's time does not fit in microseconds.
    Conversion(ConversionError),
}

impl From<clock::Error> for Error {
    fn from(error: clock::Error) -> Self {
        Error::Clock(error)
    }
}

impl From<ConversionError> for Error {
    fn from(error: ConversionError) -> Self {
        Error::Conversion(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Clock(error) => write!(f, "clock error: {:?}", error),
            Error::Conversion(error) => write!(f, "time conversion error: {:?}", error),
        }
    }
}
