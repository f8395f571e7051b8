//! Telegram Bot API channel

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{AlertingError, NotificationChannel, SendError, TelegramConfig};

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Error body returned by the Bot API
#[derive(Debug, Deserialize)]
struct ApiResponse {
    description: Option<String>,
}

/// Sends messages to one chat through a bot
pub struct TelegramChannel {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    timeout: Duration,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig, timeout: Duration) -> Result<Self, AlertingError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlertingError::ChannelSetup {
                channel: "telegram",
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            timeout,
        })
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    fn transport_error(&self, err: reqwest::Error) -> SendError {
        if err.is_timeout() {
            SendError::Timeout(self.timeout.as_millis() as u64)
        } else {
            // The URL carries the bot token
            SendError::NetworkError(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &str) -> Result<(), SendError> {
        if self.bot_token.is_empty() || self.chat_id.is_empty() {
            return Err(SendError::NotConfigured(
                "telegram bot_token and chat_id are required".to_string(),
            ));
        }

        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            debug!("Telegram accepted message for chat {}", self.chat_id);
            return Ok(());
        }

        let description = response
            .json::<ApiResponse>()
            .await
            .ok()
            .and_then(|body| body.description)
            .unwrap_or_else(|| status.to_string());

        Err(classify_status(status, description))
    }
}

fn classify_status(status: StatusCode, description: String) -> SendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SendError::AuthError(description),
        _ => SendError::Rejected(format!("HTTP {}: {}", status.as_u16(), description)),
    }
}
