//! Actuator Error Types

use thiserror::Error;

/// Errors talking to the actuator board
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// Serial port could not be opened or written
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// Write did not complete in time
    #[error("Timeout writing actuator command after {0}ms")]
    Timeout(u64),

    /// Link already closed
    #[error("Actuator link is closed")]
    Closed,
}

impl From<std::io::Error> for ActuatorError {
    fn from(err: std::io::Error) -> Self {
        ActuatorError::SerialError(err.to_string())
    }
}

impl From<tokio_serial::Error> for ActuatorError {
    fn from(err: tokio_serial::Error) -> Self {
        ActuatorError::SerialError(err.to_string())
    }
}
