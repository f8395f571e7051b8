//! Notification channel abstraction

use async_trait::async_trait;

use crate::SendError;

/// A configured sink able to deliver one formatted message
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short name used in logs and metric labels
    fn name(&self) -> &'static str;

    /// Deliver the message, reporting the outcome
    async fn send(&self, message: &str) -> Result<(), SendError>;
}
