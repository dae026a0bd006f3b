//! The tracking engine: scheduling, session lifecycle, and the caller-facing
//! control surface.

pub mod scheduler;
pub mod session;

pub use scheduler::{CheckTrigger, TriggerOutcome};
pub use session::{
    CheckOutcome, NotifyOutcome, ResolveFailure, SessionDeps, SessionEvent, SessionState,
    TrackingSession,
};

use crate::domain::Threshold;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Why a session could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("already tracking a product; stop the current session first")]
    AlreadyTracking,
    #[error("product query must not be empty")]
    EmptyQuery,
    #[error("target price must be greater than zero")]
    InvalidTargetPrice,
    #[error("recipient must not be empty")]
    MissingRecipient,
}

/// Owns at most one active [`TrackingSession`] and exposes the non-blocking
/// control surface consumed by whatever UI sits on top.
pub struct Tracker {
    deps: SessionDeps,
    interval: Duration,
    session: Option<TrackingSession>,
}

impl Tracker {
    pub fn new(deps: SessionDeps, interval: Duration) -> Self {
        Self { deps, interval, session: None }
    }

    /// Validates the inputs and spawns a fresh session. Returns the event
    /// stream the session reports through.
    pub fn start(
        &mut self,
        query: &str,
        threshold: Threshold,
    ) -> Result<mpsc::UnboundedReceiver<SessionEvent>, StartError> {
        if let Some(session) = &self.session {
            if session.state() != SessionState::Stopped {
                return Err(StartError::AlreadyTracking);
            }
        }

        let query = query.trim();
        if query.is_empty() {
            return Err(StartError::EmptyQuery);
        }
        if !threshold.is_valid() {
            return Err(StartError::InvalidTargetPrice);
        }
        if threshold.recipient.trim().is_empty() {
            return Err(StartError::MissingRecipient);
        }

        info!(
            "Starting session for {:?} (target ${:.2}, every {:?})",
            query, threshold.target_price, self.interval
        );

        let (session, events) =
            TrackingSession::spawn(self.deps.clone(), query, threshold, self.interval);
        self.session = Some(session);
        Ok(events)
    }

    /// Stops the active session, if any. Returns whether one was stopped.
    pub fn stop(&mut self) -> bool {
        match &self.session {
            Some(session) if session.state() != SessionState::Stopped => {
                session.stop();
                true
            }
            _ => false,
        }
    }

    /// Requests an immediate check on the active session.
    pub fn check_now(&self) -> TriggerOutcome {
        match &self.session {
            Some(session) => session.check_now(),
            None => TriggerOutcome::Stopped,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.as_ref().map(|s| s.state()).unwrap_or(SessionState::Idle)
    }

    pub fn product(&self) -> Option<crate::domain::TrackedProduct> {
        self.session.as_ref().and_then(|s| s.product())
    }

    /// Swaps the threshold on the active session.
    pub fn set_threshold(&self, threshold: Threshold) {
        if let Some(session) = &self.session {
            session.set_threshold(threshold);
        }
    }

    /// Mutable access to the active session, for callers that need
    /// [`TrackingSession::until_stopped`].
    pub fn session_mut(&mut self) -> Option<&mut TrackingSession> {
        self.session.as_mut()
    }
}
