//! Alerting System
//!
//! Cooldown-gated notification fan-out for drowsiness alarms:
//! - Telegram and email channels behind one send contract
//! - Per-channel failure isolation
//! - Background worker so the decision loop never waits on the network

mod channel;
mod config;
mod dispatcher;
mod email;
mod error;
pub mod message;
mod telegram;
mod worker;

pub use channel::NotificationChannel;
pub use config::{
    ChannelConfig, DispatcherConfig, EmailConfig, EmailSettings, NotificationSettings,
    TelegramConfig, TelegramSettings,
};
pub use dispatcher::NotificationDispatcher;
pub use email::EmailChannel;
pub use error::{AlertingError, SendError};
pub use message::DrowsinessReport;
pub use telegram::TelegramChannel;
pub use worker::{spawn_worker, AlertRequest, NotificationHandle};
