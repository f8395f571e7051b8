//! Notification configuration
//!
//! [`NotificationSettings`] is what operators write (with enable flags);
//! [`DispatcherConfig`] is the resolved form the dispatcher is built from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Telegram section of the settings file
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub enabled: bool,
    /// Token issued by @BotFather
    pub bot_token: String,
    pub chat_id: String,
}

/// Email section of the settings file
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from: String,
    /// Account password (an app password for Gmail)
    pub password: String,
    pub to: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            from: String::new(),
            password: String::new(),
            to: String::new(),
        }
    }
}

/// Notification settings as loaded from configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Minimum time between two delivered notifications (seconds)
    pub cooldown_secs: u64,
    /// Upper bound for a single channel send (milliseconds)
    pub send_timeout_ms: u64,
    /// Pending onset notifications kept while the sender is busy
    pub queue_capacity: usize,
    pub telegram: TelegramSettings,
    pub email: EmailSettings,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: 30,
            send_timeout_ms: 5000,
            queue_capacity: 16,
            telegram: TelegramSettings::default(),
            email: EmailSettings::default(),
        }
    }
}

impl NotificationSettings {
    /// Keep only the enabled channels, in registration order (Telegram, then email)
    pub fn resolve(&self) -> DispatcherConfig {
        let mut channels = Vec::new();

        if self.telegram.enabled {
            channels.push(ChannelConfig::Telegram(TelegramConfig {
                bot_token: self.telegram.bot_token.clone(),
                chat_id: self.telegram.chat_id.clone(),
            }));
        }

        if self.email.enabled {
            channels.push(ChannelConfig::Email(EmailConfig {
                smtp_host: self.email.smtp_host.clone(),
                smtp_port: self.email.smtp_port,
                from: self.email.from.clone(),
                password: self.email.password.clone(),
                to: self.email.to.clone(),
            }));
        }

        DispatcherConfig {
            cooldown: Duration::from_secs(self.cooldown_secs),
            send_timeout: Duration::from_millis(self.send_timeout_ms),
            channels,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from: String,
    pub password: String,
    pub to: String,
}

/// One channel to register with the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelConfig {
    Telegram(TelegramConfig),
    Email(EmailConfig),
}

/// Fully resolved dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub cooldown: Duration,
    pub send_timeout: Duration,
    pub channels: Vec<ChannelConfig>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        NotificationSettings::default().resolve()
    }
}

// Credentials never reach the logs

const REDACTED: &str = "<redacted>";

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        REDACTED
    }
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("enabled", &self.enabled)
            .field("bot_token", &redact(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("from", &self.from)
            .field("password", &redact(&self.password))
            .field("to", &self.to)
            .finish()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("from", &self.from)
            .field("password", &redact(&self.password))
            .field("to", &self.to)
            .finish()
    }
}
