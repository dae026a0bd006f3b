//! Alert delivery. The tracking engine only knows this trait; the CLI picks
//! the email or console implementation.

mod console;
mod email;

pub use console::ConsoleNotifier;
pub use email::EmailNotifier;

use crate::domain::Alert;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Why an alert could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum NotifyError {
    /// Sender email or password missing from configuration. Surfaced before
    /// any connection attempt so the caller can fix config instead of
    /// chasing transport errors.
    #[error("sender email or password is not configured")]
    MissingCredentials,

    /// Sender or recipient address did not parse as a mailbox.
    #[error("invalid mailbox address: {0}")]
    InvalidMailbox(String),

    /// The relay rejected the session or the message.
    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Sends a structured price alert. One attempt per call; re-notification on
/// later qualifying checks is the caller's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;
}
