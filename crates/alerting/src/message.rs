//! Alert message formatting

use chrono::{DateTime, Local};
use std::time::Duration;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Everything the onset notification reports
#[derive(Debug, Clone)]
pub struct DrowsinessReport {
    pub occurred_at: DateTime<Local>,
    pub ratio_left: f64,
    pub ratio_right: f64,
    /// How long both eyes had been closed when the alarm fired
    pub closed_for: Duration,
    /// Configured closure debounce
    pub closed_min: Duration,
}

impl DrowsinessReport {
    /// Render with Telegram-compatible HTML markup
    pub fn to_message(&self) -> String {
        format!(
            "⚠️ <b>DROWSINESS ALERT!</b>\n\n\
             🕐 Date/Time: {}\n\
             👁️ Left eye ratio: {:.1}\n\
             👁️ Right eye ratio: {:.1}\n\
             ⏱️ Eyes closed for: {:.1}s\n\
             ⚠️ <b>Both eyes were detected closed for {:.1}s!</b>\n\n\
             🚨 Audible and visual alarms were triggered.",
            self.occurred_at.format(TIMESTAMP_FORMAT),
            self.ratio_left,
            self.ratio_right,
            self.closed_for.as_secs_f64(),
            self.closed_min.as_secs_f64(),
        )
    }
}

/// Subject line used by the email channel
pub const EMAIL_SUBJECT: &str = "⚠️ ALERT: Drowsiness signs detected!";

/// Wrap a message into the HTML document sent by email
pub fn render_email_body(message: &str, sent_at: DateTime<Local>) -> String {
    format!(
        "<html>\n\
         <body>\n\
         <h2>⚠️ Drowsiness Detection System</h2>\n\
         <p><strong>Date/Time:</strong> {}</p>\n\
         <p><strong>Message:</strong> {}</p>\n\
         <hr>\n\
         <p style=\"color: #666;\"><small>Drowsiness Detection System</small></p>\n\
         </body>\n\
         </html>\n",
        sent_at.format(TIMESTAMP_FORMAT),
        message.replace('\n', "<br>\n"),
    )
}
