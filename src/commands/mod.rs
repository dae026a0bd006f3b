//! CLI command implementations.

pub mod check;
pub mod track;

pub use check::CheckCommand;
pub use track::TrackCommand;

use crate::amazon::client::{AmazonClient, PageFetcher};
use crate::config::Config;
use crate::notifier::{ConsoleNotifier, EmailNotifier, Notifier};
use crate::tracker::SessionDeps;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Wires the live fetcher and the chosen notifier into session dependencies.
pub(crate) fn build_deps(config: &Config, no_email: bool) -> Result<SessionDeps> {
    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(AmazonClient::new(config).context("Failed to create HTTP client")?);

    let notifier: Arc<dyn Notifier> = if no_email {
        Arc::new(ConsoleNotifier::new())
    } else {
        Arc::new(EmailNotifier::new(config.smtp.clone(), config.currency.clone()))
    };

    Ok(SessionDeps { fetcher, notifier, base_url: config.base_url.clone() })
}
