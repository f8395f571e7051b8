//! SMTP email channel

use async_trait::async_trait;
use chrono::Local;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::debug;

use crate::message::{render_email_body, EMAIL_SUBJECT};
use crate::{AlertingError, EmailConfig, NotificationChannel, SendError};

/// SMTP reply code for rejected credentials
const AUTH_FAILED: &str = "535";

/// Sends HTML mail through an authenticated STARTTLS submission server
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
    timeout: Duration,
}

impl EmailChannel {
    pub fn new(config: &EmailConfig, timeout: Duration) -> Result<Self, AlertingError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AlertingError::ChannelSetup {
                channel: "email",
                reason: e.to_string(),
            })?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.from.clone(),
                config.password.clone(),
            ))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            to: config.to.clone(),
            timeout,
        })
    }

    fn build_message(&self, message: &str) -> Result<Message, SendError> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| SendError::NotConfigured(format!("invalid sender '{}': {}", self.from, e)))?;
        let to: Mailbox = self
            .to
            .parse()
            .map_err(|e| SendError::NotConfigured(format!("invalid recipient '{}': {}", self.to, e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(EMAIL_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(render_email_body(message, Local::now()))
            .map_err(|e| SendError::NotConfigured(e.to_string()))
    }

    fn classify(&self, err: SmtpError) -> SendError {
        if err.is_timeout() {
            return SendError::Timeout(self.timeout.as_millis() as u64);
        }
        match err.status() {
            Some(code) if code.to_string() == AUTH_FAILED => SendError::AuthError(err.to_string()),
            Some(_) if err.is_permanent() => SendError::Rejected(err.to_string()),
            _ => SendError::NetworkError(err.to_string()),
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, message: &str) -> Result<(), SendError> {
        let email = self.build_message(message)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| self.classify(e))?;

        debug!("Email delivered to {}", self.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from: &str, to: &str) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: 587,
            from: from.into(),
            password: "app-password".into(),
            to: to.into(),
        }
    }

    #[tokio::test]
    async fn test_build_message() {
        let channel =
            EmailChannel::new(&config("alarm@example.com", "family@example.com"), Duration::from_secs(5))
                .unwrap();
        let message = channel.build_message("eyes closed").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: family@example.com"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn test_invalid_address_is_not_configured() {
        let channel = EmailChannel::new(&config("", "family@example.com"), Duration::from_secs(5))
            .unwrap();
        let result = channel.send("eyes closed").await;
        assert!(matches!(result, Err(SendError::NotConfigured(_))));
    }
}
