//! Driver Monitoring System (DMS)
//!
//! Drowsiness decision engine:
//! - Binocular closure signal from per-eye openness ratios
//! - Debounced alarm state machine (closure debounce + release debounce)
//! - Actuator command per tick

pub mod analysis;
pub mod config;
pub mod state;

pub use analysis::{closure_signal, EyeLandmarks, EyeRatios, EyeSample};
pub use config::DmsConfig;
pub use state::{AlarmEvent, AlarmStateMachine, Command, Countdown, Phase, Tick};

use thiserror::Error;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),
}
