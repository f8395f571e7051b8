//! Notification Dispatcher Implementation

use metrics::counter;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::{
    ChannelConfig, DispatcherConfig, EmailChannel, NotificationChannel, SendError,
    TelegramChannel,
};

/// Cooldown-gated, best-effort fan-out over the configured channels
pub struct NotificationDispatcher {
    /// Channels in registration order
    channels: Vec<Box<dyn NotificationChannel>>,
    /// Minimum time between two delivered notifications
    cooldown: Duration,
    /// Upper bound for a single channel send
    send_timeout: Duration,
    /// Last time at least one channel accepted a message
    last_sent: Option<Instant>,
}

impl NotificationDispatcher {
    /// Create a dispatcher without channels
    pub fn new(cooldown: Duration, send_timeout: Duration) -> Self {
        Self {
            channels: Vec::new(),
            cooldown,
            send_timeout,
            last_sent: None,
        }
    }

    /// Build every configured channel.
    ///
    /// A channel that cannot be built is logged and left out, the others
    /// are still registered.
    pub fn from_config(config: &DispatcherConfig) -> Self {
        info!("Creating notification dispatcher with config: {:?}", config);
        let mut dispatcher = Self::new(config.cooldown, config.send_timeout);

        for channel in &config.channels {
            let built: Result<Box<dyn NotificationChannel>, _> = match channel {
                ChannelConfig::Telegram(c) => TelegramChannel::new(c, config.send_timeout)
                    .map(|ch| Box::new(ch) as Box<dyn NotificationChannel>),
                ChannelConfig::Email(c) => EmailChannel::new(c, config.send_timeout)
                    .map(|ch| Box::new(ch) as Box<dyn NotificationChannel>),
            };

            match built {
                Ok(ch) => dispatcher.add_channel(ch),
                Err(e) => error!("{}", e),
            }
        }

        dispatcher
    }

    /// Register a channel after the existing ones
    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        info!("Notification channel registered: {}", channel.name());
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    /// Whether a notification at `now` would be suppressed
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.last_sent
            .is_some_and(|last| now.saturating_duration_since(last) < self.cooldown)
    }

    /// Send `message` through every channel.
    ///
    /// Returns `true` when at least one channel accepted it. Nothing is
    /// attempted while in cooldown; a round where every channel fails does
    /// not start a cooldown.
    pub async fn send_alert(&mut self, message: &str, now: Instant) -> bool {
        if self.in_cooldown(now) {
            debug!("Notification suppressed: in cooldown period");
            counter!("notifications_suppressed_total").increment(1);
            return false;
        }

        if self.channels.is_empty() {
            debug!("No notification channels configured");
            return false;
        }

        let mut delivered = 0;
        for channel in &self.channels {
            match self.attempt(channel.as_ref(), message).await {
                Ok(()) => {
                    info!(channel = channel.name(), "Notification delivered");
                    delivered += 1;
                }
                Err(e) => {
                    warn!(channel = channel.name(), error = %e, "Notification failed");
                    counter!("notification_channel_failures_total", "channel" => channel.name())
                        .increment(1);
                }
            }
        }

        if delivered == 0 {
            warn!("All {} notification channels failed", self.channels.len());
            return false;
        }

        self.last_sent = Some(now);
        counter!("notifications_sent_total").increment(1);
        true
    }

    async fn attempt(&self, channel: &dyn NotificationChannel, message: &str) -> Result<(), SendError> {
        match tokio::time::timeout(self.send_timeout, channel.send(message)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SendError::Timeout(self.send_timeout.as_millis() as u64)),
        }
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::from_config(&DispatcherConfig::default())
    }
}
