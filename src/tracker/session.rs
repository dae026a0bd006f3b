//! A single tracking session: resolve once, then fetch → parse → evaluate →
//! notify on a timer until stopped.

use crate::amazon::client::{FetchFailure, PageFetcher};
use crate::amazon::parser::{self, ParseError};
use crate::amazon::resolver::{ResolveError, Resolver};
use crate::domain::{self, PriceReading, Threshold, TrackedProduct};
use crate::notifier::{Notifier, NotifyError};
use crate::tracker::scheduler::{self, CheckTrigger, Scheduler, SchedulerHandle, TriggerOutcome};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Collaborators a session needs to do its work.
#[derive(Clone)]
pub struct SessionDeps {
    pub fetcher: Arc<dyn PageFetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub base_url: String,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session running (the tracker facade's resting state).
    Idle,
    /// Searching for the product URL.
    Resolving,
    /// Between checks, waiting on the timer.
    Tracking,
    /// A fetch-parse-evaluate cycle is in flight.
    Checking,
    /// Terminal; a new `start` builds a fresh session.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Resolving => "resolving",
            SessionState::Tracking => "tracking",
            SessionState::Checking => "checking",
            SessionState::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

/// Why resolution ended the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveFailure {
    NotFound,
    Network { error: String },
}

impl From<ResolveError> for ResolveFailure {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { .. } => ResolveFailure::NotFound,
            ResolveError::Network(fetch) => ResolveFailure::Network { error: fetch.to_string() },
        }
    }
}

/// Whether a triggered alert actually went out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Sent,
    Failed { error: NotifyError },
}

/// The one terminal outcome every check cycle produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Price at or below target; a notification was attempted.
    Alert { reading: PriceReading, target_price: f64, notification: NotifyOutcome },
    /// Price above target.
    NoAlert { reading: PriceReading, target_price: f64 },
    /// The product page could not be fetched. Non-fatal; tracking continues.
    FetchFailed { failure: FetchFailure },
    /// The page came back but yielded no usable price. Non-fatal.
    ParseFailed { error: ParseError },
    /// The threshold was edited to a non-positive target. The session stops.
    InvalidTarget { target_price: f64 },
}

impl CheckOutcome {
    /// Machine-readable outcome tag.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckOutcome::Alert { .. } => "alert",
            CheckOutcome::NoAlert { .. } => "no_alert",
            CheckOutcome::FetchFailed { .. } => "fetch_failed",
            CheckOutcome::ParseFailed { .. } => "parse_failed",
            CheckOutcome::InvalidTarget { .. } => "invalid_target",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Alert { reading, target_price, notification } => {
                write!(
                    f,
                    "ALERT! {} is ${:.2} (Target: ${:.2}). ",
                    reading.title, reading.price, target_price
                )?;
                match notification {
                    NotifyOutcome::Sent => write!(f, "Email sent."),
                    NotifyOutcome::Failed { error: NotifyError::MissingCredentials } => {
                        write!(f, "Sender credentials not configured; no email sent.")
                    }
                    NotifyOutcome::Failed { error } => {
                        write!(f, "Failed to send email alert: {error}")
                    }
                }
            }
            CheckOutcome::NoAlert { reading, .. } => {
                write!(f, "Price for {} is ${:.2}. No alert sent.", reading.title, reading.price)
            }
            CheckOutcome::FetchFailed { failure } => {
                write!(f, "Failed to get product page: {}", failure.error)
            }
            CheckOutcome::ParseFailed { error } => write!(f, "{error}"),
            CheckOutcome::InvalidTarget { target_price } => {
                write!(f, "Target price {target_price} is not valid. Tracking stopped.")
            }
        }
    }
}

/// Everything a session reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Resolved { product: TrackedProduct },
    ResolveFailed { query: String, reason: ResolveFailure },
    Check { trigger: CheckTrigger, outcome: CheckOutcome },
    Stopped,
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Resolved { product } => {
                let mut url: String = product.url.chars().take(50).collect();
                if url.len() < product.url.len() {
                    url.push_str("...");
                }
                write!(f, "Found product page. URL: {url}")
            }
            SessionEvent::ResolveFailed { query, reason } => match reason {
                ResolveFailure::NotFound => {
                    write!(f, "Failed to find product URL for '{query}'. Tracking stopped.")
                }
                ResolveFailure::Network { error } => {
                    write!(f, "Product search failed: {error}. Tracking stopped.")
                }
            },
            SessionEvent::Check { outcome, .. } => write!(f, "{outcome}"),
            SessionEvent::Stopped => write!(f, "Tracking stopped."),
        }
    }
}

/// Runs one fetch → parse → evaluate → (notify) pass against a product URL.
///
/// Always returns exactly one outcome; no error escapes the cycle.
pub async fn run_check(
    fetcher: &dyn PageFetcher,
    notifier: &dyn Notifier,
    url: &str,
    threshold: &Threshold,
) -> CheckOutcome {
    if !threshold.is_valid() {
        return CheckOutcome::InvalidTarget { target_price: threshold.target_price };
    }

    let html = match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(err) => return CheckOutcome::FetchFailed { failure: FetchFailure::from(&err) },
    };

    let reading = match parser::parse_product(&html) {
        Ok(reading) => reading,
        Err(error) => return CheckOutcome::ParseFailed { error },
    };

    match domain::evaluate(&reading, threshold, url) {
        Some(alert) => {
            let notification = match notifier.notify(&alert).await {
                Ok(()) => NotifyOutcome::Sent,
                Err(error) => {
                    warn!("Notification failed: {}", error);
                    NotifyOutcome::Failed { error }
                }
            };
            CheckOutcome::Alert {
                reading,
                target_price: threshold.target_price,
                notification,
            }
        }
        None => CheckOutcome::NoAlert { reading, target_price: threshold.target_price },
    }
}

/// Handle to a running session. All methods are non-blocking; results flow
/// back through the event channel handed out at spawn time.
pub struct TrackingSession {
    control: Arc<SchedulerHandle>,
    state_rx: watch::Receiver<SessionState>,
    product_rx: watch::Receiver<Option<TrackedProduct>>,
    threshold_tx: watch::Sender<Threshold>,
    task: JoinHandle<()>,
}

impl TrackingSession {
    /// Spawns the session worker: resolve the query, then check on a timer.
    pub fn spawn(
        deps: SessionDeps,
        query: impl Into<String>,
        threshold: Threshold,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (handle, sched) = scheduler::scheduler();
        let control = Arc::new(handle);
        let (state_tx, state_rx) = watch::channel(SessionState::Resolving);
        let (threshold_tx, threshold_rx) = watch::channel(threshold);
        let (product_tx, product_rx) = watch::channel(None);

        let worker = Worker {
            deps,
            query: query.into(),
            interval,
            control: control.clone(),
            sched,
            threshold_rx,
            events_tx,
            state_tx,
            product_tx,
        };
        let task = tokio::spawn(worker.run());

        (Self { control, state_rx, product_rx, threshold_tx, task }, events_rx)
    }

    /// Requests a cooperative stop: no further cycles are scheduled, an
    /// in-flight cycle finishes and is reported.
    pub fn stop(&self) {
        self.control.cancel();
    }

    /// Requests an immediate check, mutually exclusive with the periodic one.
    pub fn check_now(&self) -> TriggerOutcome {
        self.control.trigger()
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// The resolved product, cleared once the session stops.
    pub fn product(&self) -> Option<TrackedProduct> {
        self.product_rx.borrow().clone()
    }

    /// Swaps the threshold used by future cycles. Each cycle snapshots it at
    /// start and re-validates before use.
    pub fn set_threshold(&self, threshold: Threshold) {
        self.threshold_tx.send_replace(threshold);
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold_tx.borrow().clone()
    }

    /// Resolves once the session reaches its terminal state.
    pub async fn until_stopped(&mut self) {
        let _ = self.state_rx.wait_for(|state| *state == SessionState::Stopped).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

struct Worker {
    deps: SessionDeps,
    query: String,
    interval: Duration,
    control: Arc<SchedulerHandle>,
    sched: Scheduler,
    threshold_rx: watch::Receiver<Threshold>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    state_tx: watch::Sender<SessionState>,
    product_tx: watch::Sender<Option<TrackedProduct>>,
}

impl Worker {
    async fn run(self) {
        let Worker {
            deps,
            query,
            interval,
            control,
            sched,
            threshold_rx,
            events_tx,
            state_tx,
            product_tx,
        } = self;

        let finish = |events_tx: &mpsc::UnboundedSender<SessionEvent>| {
            state_tx.send_replace(SessionState::Stopped);
            let _ = events_tx.send(SessionEvent::Stopped);
        };

        let resolver = Resolver::new(deps.fetcher.clone(), deps.base_url.clone());

        let product = match resolver.resolve(&query).await {
            Ok(product) => product,
            Err(err) => {
                // Resolution failure is fatal for this session
                warn!("Resolution failed for {:?}: {}", query, err);
                let _ = events_tx
                    .send(SessionEvent::ResolveFailed { query: query.clone(), reason: err.into() });
                finish(&events_tx);
                return;
            }
        };

        info!("Tracking {:?} at {}", query, product.url);
        product_tx.send_replace(Some(product.clone()));
        let _ = events_tx.send(SessionEvent::Resolved { product: product.clone() });
        state_tx.send_replace(SessionState::Tracking);

        let cycle = Arc::new(Cycle {
            fetcher: deps.fetcher,
            notifier: deps.notifier,
            url: product.url,
            control: control.clone(),
            threshold_rx,
            events_tx: events_tx.clone(),
            state_tx: state_tx.clone(),
        });

        // First check runs right away; afterwards the timer takes over
        if !control.is_cancelled() {
            cycle.run(CheckTrigger::Periodic).await;

            let sched_cycle = cycle.clone();
            sched
                .run(interval, move |trigger| {
                    let cycle = sched_cycle.clone();
                    async move { cycle.run(trigger).await }
                })
                .await;
        }

        product_tx.send_replace(None);
        finish(&events_tx);
    }
}

struct Cycle {
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    url: String,
    control: Arc<SchedulerHandle>,
    threshold_rx: watch::Receiver<Threshold>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    state_tx: watch::Sender<SessionState>,
}

impl Cycle {
    async fn run(&self, trigger: CheckTrigger) {
        self.state_tx.send_replace(SessionState::Checking);

        // Snapshot so a threshold edit mid-cycle cannot skew evaluation
        let threshold = self.threshold_rx.borrow().clone();

        let outcome =
            run_check(self.fetcher.as_ref(), self.notifier.as_ref(), &self.url, &threshold).await;

        if matches!(outcome, CheckOutcome::InvalidTarget { .. }) {
            self.control.cancel();
        }

        let _ = self.events_tx.send(SessionEvent::Check { trigger, outcome });

        if !self.control.is_cancelled() {
            self.state_tx.send_replace(SessionState::Tracking);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> PriceReading {
        PriceReading::new("Headphones X", 199.99)
    }

    #[test]
    fn test_outcome_kinds() {
        let alert = CheckOutcome::Alert {
            reading: reading(),
            target_price: 200.0,
            notification: NotifyOutcome::Sent,
        };
        assert_eq!(alert.kind(), "alert");

        let no_alert = CheckOutcome::NoAlert { reading: reading(), target_price: 150.0 };
        assert_eq!(no_alert.kind(), "no_alert");

        let parse_failed = CheckOutcome::ParseFailed { error: ParseError::MissingPrice };
        assert_eq!(parse_failed.kind(), "parse_failed");
    }

    #[test]
    fn test_alert_outcome_display() {
        let outcome = CheckOutcome::Alert {
            reading: reading(),
            target_price: 200.0,
            notification: NotifyOutcome::Sent,
        };
        assert_eq!(
            outcome.to_string(),
            "ALERT! Headphones X is $199.99 (Target: $200.00). Email sent."
        );
    }

    #[test]
    fn test_alert_outcome_display_missing_credentials() {
        let outcome = CheckOutcome::Alert {
            reading: reading(),
            target_price: 200.0,
            notification: NotifyOutcome::Failed { error: NotifyError::MissingCredentials },
        };
        let line = outcome.to_string();
        assert!(line.starts_with("ALERT! Headphones X"));
        assert!(line.contains("credentials not configured"));
    }

    #[test]
    fn test_no_alert_outcome_display() {
        let outcome = CheckOutcome::NoAlert { reading: reading(), target_price: 150.0 };
        assert_eq!(outcome.to_string(), "Price for Headphones X is $199.99. No alert sent.");
    }

    #[test]
    fn test_resolved_event_display_truncates_url() {
        let product = TrackedProduct {
            url: format!("https://www.amazon.com.mx/dp/{}", "X".repeat(60)),
            last_known_title: None,
        };
        let line = SessionEvent::Resolved { product }.to_string();
        assert!(line.ends_with("..."));
        assert!(line.len() < 90);
    }

    #[test]
    fn test_resolve_failed_event_display() {
        let event = SessionEvent::ResolveFailed {
            query: "vanishing gadget".to_string(),
            reason: ResolveFailure::NotFound,
        };
        assert_eq!(
            event.to_string(),
            "Failed to find product URL for 'vanishing gadget'. Tracking stopped."
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = SessionEvent::Check {
            trigger: CheckTrigger::Manual,
            outcome: CheckOutcome::NoAlert { reading: reading(), target_price: 150.0 },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"check""#));
        assert!(json.contains(r#""trigger":"manual""#));
        assert!(json.contains(r#""kind":"no_alert""#));
    }
}
