//! Core data types for a tracking session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback title when the product page carries no `#productTitle`.
pub const UNKNOWN_TITLE: &str = "Unknown Product Title";

/// The product a session is locked onto, resolved once at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProduct {
    /// Canonical product page URL
    pub url: String,
    /// Title text captured from the search result card, if any
    pub last_known_title: Option<String>,
}

/// One fetch-and-parse result. Produced fresh every check, never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReading {
    /// Product title (or [`UNKNOWN_TITLE`])
    pub title: String,
    /// Listed price
    pub price: f64,
    /// When the page was read
    pub fetched_at: DateTime<Utc>,
}

impl PriceReading {
    /// Creates a reading stamped with the current time.
    pub fn new(title: impl Into<String>, price: f64) -> Self {
        Self { title: title.into(), price, fetched_at: Utc::now() }
    }
}

/// Target price and alert recipient for a session.
///
/// The caller may swap this between checks; the engine snapshots it at
/// cycle start and re-validates on every use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub target_price: f64,
    /// Email address alerts go to
    pub recipient: String,
}

impl Threshold {
    pub fn new(target_price: f64, recipient: impl Into<String>) -> Self {
        Self { target_price, recipient: recipient.into() }
    }

    /// A usable threshold has a positive finite target.
    pub fn is_valid(&self) -> bool {
        self.target_price.is_finite() && self.target_price > 0.0
    }
}

/// Decision artifact produced when a reading qualifies against a threshold.
/// Lives only between evaluation and the notify attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub reading: PriceReading,
    pub threshold: Threshold,
    pub url: String,
}

/// Compares a reading against a threshold. A price at or below the target
/// qualifies (equal counts as a hit).
pub fn evaluate(reading: &PriceReading, threshold: &Threshold, url: &str) -> Option<Alert> {
    if reading.price <= threshold.target_price {
        Some(Alert {
            reading: reading.clone(),
            threshold: threshold.clone(),
            url: url.to_string(),
        })
    } else {
        None
    }
}
