//! Alerting Error Types

use thiserror::Error;

/// Why a single channel failed to deliver a notification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// Connection, DNS or transport failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Credentials refused by the remote service
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// No answer within the send timeout
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// Channel is missing required settings
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Remote service answered but refused the message
    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Errors while setting up the alerting pipeline
#[derive(Debug, Error)]
pub enum AlertingError {
    /// A channel could not be constructed from its configuration
    #[error("Failed to set up {channel} channel: {reason}")]
    ChannelSetup {
        channel: &'static str,
        reason: String,
    },
}
