//! Recurring-check scheduling: a cancellable interval loop with a
//! single-slot out-of-band trigger.
//!
//! One loop runs all firings, so periodic and manual checks are strictly
//! serialized. The interval is measured from the end of the previous firing
//! (drift-tolerant, not wall-clock-exact).

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// What caused a firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckTrigger {
    /// The interval elapsed.
    Periodic,
    /// An on-demand request via [`SchedulerHandle::trigger`].
    Manual,
}

/// Result of requesting an out-of-band firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Will run now, or as soon as the in-flight firing completes.
    Accepted,
    /// A manual request is already pending; this one was rejected rather
    /// than queued behind it.
    Busy,
    /// The loop has been cancelled.
    Stopped,
}

/// Control side: cancel the loop or request an immediate firing.
pub struct SchedulerHandle {
    cancel_tx: watch::Sender<bool>,
    kick_tx: mpsc::Sender<()>,
}

impl SchedulerHandle {
    /// Prevents all future firings. A firing already in progress completes,
    /// but nothing further is scheduled.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Requests an immediate firing. The single pending slot makes manual
    /// requests wait behind an in-flight firing instead of racing it.
    pub fn trigger(&self) -> TriggerOutcome {
        if self.is_cancelled() {
            return TriggerOutcome::Stopped;
        }

        match self.kick_tx.try_send(()) {
            Ok(()) => TriggerOutcome::Accepted,
            Err(TrySendError::Full(())) => TriggerOutcome::Busy,
            Err(TrySendError::Closed(())) => TriggerOutcome::Stopped,
        }
    }
}

/// Loop side, consumed by [`Scheduler::run`].
pub struct Scheduler {
    cancel_rx: watch::Receiver<bool>,
    kick_rx: mpsc::Receiver<()>,
}

/// Creates a connected handle/loop pair.
pub fn scheduler() -> (SchedulerHandle, Scheduler) {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (kick_tx, kick_rx) = mpsc::channel(1);

    (SchedulerHandle { cancel_tx, kick_tx }, Scheduler { cancel_rx, kick_rx })
}

impl Scheduler {
    /// Drives `action` until cancelled: periodically after each `interval`
    /// elapses, and immediately on manual triggers. Firings never overlap.
    pub async fn run<A, Fut>(mut self, interval: Duration, mut action: A)
    where
        A: FnMut(CheckTrigger) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        loop {
            // Re-check after every firing so a cancel during the action
            // stops the loop before anything else is scheduled.
            if *self.cancel_rx.borrow_and_update() {
                break;
            }

            let trigger = tokio::select! {
                biased;
                _ = self.cancel_rx.changed() => break,
                kick = self.kick_rx.recv() => match kick {
                    Some(()) => CheckTrigger::Manual,
                    None => break,
                },
                _ = tokio::time::sleep(interval) => CheckTrigger::Periodic,
            };

            debug!("Scheduler firing ({:?})", trigger);
            action(trigger).await;
        }

        debug!("Scheduler loop ended");
    }
}
