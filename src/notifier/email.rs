//! Email alerts over SMTP with STARTTLS.

use crate::config::SmtpConfig;
use crate::domain::Alert;
use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::info;

const SEND_TIMEOUT: Duration = Duration::from_secs(60);
const SUBJECT_TITLE_LEN: usize = 50;

/// Sends price alerts through a mail relay using the configured sender
/// credentials.
pub struct EmailNotifier {
    smtp: SmtpConfig,
    currency: String,
}

impl EmailNotifier {
    pub fn new(smtp: SmtpConfig, currency: impl Into<String>) -> Self {
        Self { smtp, currency: currency.into() }
    }

    fn subject(title: &str) -> String {
        let short: String = title.chars().take(SUBJECT_TITLE_LEN).collect();
        format!("🔥 PRICE ALERT! {short}...")
    }

    fn body(&self, alert: &Alert) -> String {
        format!(
            "The product is now on sale for ${:.2} {currency}!\n\n\
             Your target price was ${:.2} {currency}.\n\n\
             Product: {}\n\
             Buy it now: {}",
            alert.reading.price,
            alert.threshold.target_price,
            alert.reading.title,
            alert.url,
            currency = self.currency,
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        let (sender, password) = match self.smtp.credentials() {
            Some(creds) => creds,
            None => return Err(NotifyError::MissingCredentials),
        };

        let from: Mailbox = sender
            .parse()
            .map_err(|_| NotifyError::InvalidMailbox(sender.to_string()))?;
        let to: Mailbox = alert
            .threshold
            .recipient
            .parse()
            .map_err(|_| NotifyError::InvalidMailbox(alert.threshold.recipient.clone()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(Self::subject(&alert.reading.title))
            .header(ContentType::TEXT_PLAIN)
            .body(self.body(alert))
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.server)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(self.smtp.port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .timeout(Some(SEND_TIMEOUT))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        info!("Price alert emailed to {}", alert.threshold.recipient);
        Ok(())
    }
}
