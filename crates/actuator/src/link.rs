//! Actuator links
//!
//! The board understands one byte per command (`'A'` idle, `'F'` alarm).

use async_trait::async_trait;
use dms::Command;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info};

use crate::ActuatorError;

/// Actuator link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Serial device (e.g. "/dev/ttyUSB0" or "COM3"); `None` runs without hardware
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Wait after opening while the board resets (milliseconds)
    pub settle_ms: u64,
    /// Upper bound for one command write (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            settle_ms: 2000,
            write_timeout_ms: 50,
        }
    }
}

/// Destination for per-tick actuator commands
#[async_trait]
pub trait ActuatorLink: Send {
    async fn write_command(&mut self, command: Command) -> Result<(), ActuatorError>;
}

/// Board attached over a serial port
pub struct SerialActuator {
    device: String,
    port: SerialStream,
    write_timeout: Duration,
}

impl SerialActuator {
    /// Open the port and wait for the board to come up
    pub async fn open(device: &str, config: &ActuatorConfig) -> Result<Self, ActuatorError> {
        info!("Opening actuator on {} at {} baud", device, config.baud_rate);
        let port = tokio_serial::new(device, config.baud_rate).open_native_async()?;

        // Opening the port resets most boards
        tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;
        info!("Actuator connected on {}", device);

        Ok(Self {
            device: device.to_string(),
            port,
            write_timeout: Duration::from_millis(config.write_timeout_ms),
        })
    }
}

#[async_trait]
impl ActuatorLink for SerialActuator {
    async fn write_command(&mut self, command: Command) -> Result<(), ActuatorError> {
        let byte = [command.as_byte()];
        match tokio::time::timeout(self.write_timeout, self.port.write_all(&byte)).await {
            Ok(result) => result.map_err(ActuatorError::from),
            Err(_) => Err(ActuatorError::Timeout(self.write_timeout.as_millis() as u64)),
        }
    }
}

impl std::fmt::Debug for SerialActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialActuator")
            .field("device", &self.device)
            .finish()
    }
}

/// Used when no board is attached; commands are only logged
#[derive(Debug, Default)]
pub struct NullActuator;

#[async_trait]
impl ActuatorLink for NullActuator {
    async fn write_command(&mut self, command: Command) -> Result<(), ActuatorError> {
        debug!("Actuator command {} (no hardware)", command.as_byte() as char);
        Ok(())
    }
}

/// In-memory link for testing (records every byte written)
#[derive(Debug, Clone, Default)]
pub struct MockActuator {
    written: Arc<Mutex<Vec<u8>>>,
    fail: bool,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A link whose every write fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Bytes written so far
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ActuatorLink for MockActuator {
    async fn write_command(&mut self, command: Command) -> Result<(), ActuatorError> {
        if self.fail {
            return Err(ActuatorError::SerialError("mock write failure".to_string()));
        }
        self.written
            .lock()
            .map_err(|_| ActuatorError::Closed)?
            .push(command.as_byte());
        Ok(())
    }
}

/// Open the configured link, falling back to [`NullActuator`].
///
/// A missing board must not stop detection, so open failures are logged
/// and swallowed.
pub async fn connect(config: &ActuatorConfig) -> Box<dyn ActuatorLink> {
    let Some(device) = config.port.as_deref() else {
        info!("No actuator port configured, running without hardware");
        return Box::new(NullActuator);
    };

    match SerialActuator::open(device, config).await {
        Ok(link) => Box::new(link),
        Err(e) => {
            error!("Actuator not found on {}: {}. Running without hardware", device, e);
            Box::new(NullActuator)
        }
    }
}
