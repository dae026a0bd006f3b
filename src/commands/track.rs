//! Long-running tracking command.

use crate::config::Config;
use crate::domain::Threshold;
use crate::tracker::{SessionEvent, Tracker};
use anyhow::Result;
use chrono::Local;
use tracing::warn;

/// Starts a tracking session and streams its status lines until the session
/// ends or the user interrupts.
pub struct TrackCommand {
    config: Config,
    json: bool,
}

impl TrackCommand {
    /// Creates a new track command.
    pub fn new(config: Config, json: bool) -> Self {
        Self { config, json }
    }

    pub async fn execute(
        &self,
        query: &str,
        target_price: f64,
        recipient: &str,
        no_email: bool,
    ) -> Result<()> {
        if !no_email && !self.config.smtp.has_credentials() {
            warn!(
                "SMTP credentials not set (MY_EMAIL / MY_PASSWORD); \
                 price checks will run but alerts cannot be emailed"
            );
        }

        let deps = super::build_deps(&self.config, no_email)?;
        let mut tracker = Tracker::new(deps, self.config.interval());

        let mut events = tracker.start(query, Threshold::new(target_price, recipient))?;
        self.status_line("Setup complete. Starting search...");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    self.status_line("Stop requested.");
                    tracker.stop();
                }
                event = events.recv() => match event {
                    Some(event) => self.report(&event),
                    // Worker gone; session is over
                    None => break,
                },
            }
        }

        Ok(())
    }

    fn report(&self, event: &SessionEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!("Failed to serialize event: {}", err),
            }
            return;
        }

        self.status_line(&event.to_string());

        if matches!(event, SessionEvent::Resolved { .. }) {
            self.status_line(&format!(
                "Starting periodic checks ({}-hour interval)...",
                self.config.interval_hours
            ));
        }
    }

    fn status_line(&self, message: &str) {
        if !self.json {
            println!("{} - {}", Local::now().format("%H:%M:%S"), message);
        }
    }
}
