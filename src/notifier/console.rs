//! Console fallback for running without outgoing mail.

use crate::domain::Alert;
use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use tracing::info;

/// Prints alerts to stdout instead of emailing them.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        println!(
            "🔥 {} is ${:.2} (target ${:.2}) - {}",
            alert.reading.title, alert.reading.price, alert.threshold.target_price, alert.url
        );
        info!("Alert sent to console: {}", alert.reading.title);
        Ok(())
    }
}
