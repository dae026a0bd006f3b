//! amz-price-watch - Amazon price tracker with email alerts
//!
//! Resolves a free-text product query to a product page, then watches the
//! listed price on a recurring schedule and emails an alert when it drops
//! to or below a target.

pub mod amazon;
pub mod commands;
pub mod config;
pub mod domain;
pub mod notifier;
pub mod tracker;

pub use amazon::client::{AmazonClient, PageFetcher};
pub use amazon::resolver::{ResolveError, Resolver};
pub use config::Config;
pub use domain::{Alert, PriceReading, Threshold, TrackedProduct};
pub use notifier::{Notifier, NotifyError};
pub use tracker::{SessionDeps, Tracker, TrackingSession};
