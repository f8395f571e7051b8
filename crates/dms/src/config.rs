//! DMS configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Openness ratio below which an eye counts as closed (x100 scale)
    pub closed_threshold: f64,

    /// Both eyes closed for this long before the alarm fires (milliseconds)
    pub closed_min_ms: u64,

    /// Eyes open for this long before an active alarm is released (milliseconds)
    pub open_min_ms: u64,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            closed_threshold: 23.0,
            closed_min_ms: 3000,
            open_min_ms: 3000,
        }
    }
}

impl DmsConfig {
    /// Create strict config (alarm fires sooner, releases later)
    pub fn strict() -> Self {
        Self {
            closed_threshold: 25.0,
            closed_min_ms: 1500,
            open_min_ms: 4000,
        }
    }

    /// Create lenient config (alarm fires later, releases sooner)
    pub fn lenient() -> Self {
        Self {
            closed_threshold: 20.0,
            closed_min_ms: 4500,
            open_min_ms: 2000,
        }
    }

    pub fn closed_min_duration(&self) -> Duration {
        Duration::from_millis(self.closed_min_ms)
    }

    pub fn open_min_duration(&self) -> Duration {
        Duration::from_millis(self.open_min_ms)
    }

    /// Reject values the detector cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        if !self.closed_threshold.is_finite() || self.closed_threshold <= 0.0 {
            return Err(DmsError::Config(format!(
                "closed_threshold must be a positive number, got {}",
                self.closed_threshold
            )));
        }
        Ok(())
    }
}
