//! Actuator Link
//!
//! Async serial link to the alarm board (buzzer / lights). The board only
//! needs the current command byte, written once per decision tick.

mod error;
mod link;

pub use error::ActuatorError;
pub use link::{connect, ActuatorConfig, ActuatorLink, MockActuator, NullActuator, SerialActuator};
