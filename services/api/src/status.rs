//! Session-wide busy flag and dismissible error

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub(crate) struct StatusState {
    in_flight: usize,
    error: Option<String>,
}

/// Busy/error pair exposed to clients
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SessionStatus {
    pub busy: bool,
    pub error: Option<String>,
}

/// Tracks in-flight work and the most recent user-facing failure.
///
/// Busy is a counter so that overlapping batches keep the session busy until
/// the last one finishes.
#[derive(Clone)]
pub struct StatusTracker {
    state: Arc<watch::Sender<StatusState>>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(StatusState::default());
        Self {
            state: Arc::new(state),
        }
    }

    pub fn current(&self) -> SessionStatus {
        let state = self.state.borrow();
        SessionStatus {
            busy: state.in_flight > 0,
            error: state.error.clone(),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<StatusState> {
        self.state.subscribe()
    }

    /// Mark the session busy and clear any previous error until the guard drops
    pub fn begin(&self) -> BusyGuard {
        self.state.send_modify(|state| {
            state.in_flight += 1;
            state.error = None;
        });
        BusyGuard {
            tracker: self.clone(),
        }
    }

    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("Session error: {}", message);
        self.state.send_modify(|state| state.error = Some(message));
    }

    /// Returns false when there was nothing to dismiss
    pub fn dismiss_error(&self) -> bool {
        self.state.send_if_modified(|state| state.error.take().is_some())
    }
}

/// Holds the session busy while alive
pub struct BusyGuard {
    tracker: StatusTracker,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.tracker
            .state
            .send_modify(|state| state.in_flight = state.in_flight.saturating_sub(1));
    }
}
