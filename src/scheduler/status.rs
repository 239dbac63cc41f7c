//! Session status lifecycle shared by both schedulers

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Upload session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Scheduler built, session not started
    Idle,
    CalculatingHash,
    Uploading,
    /// A chunk (adaptive) completed; a progress pulse, not the end of the session
    RequestFinished,
    RequestFailed,
}

/// Publishes status transitions of one session.
///
/// Only the owning scheduler holds the tracker; observers get read-only
/// receivers that keep the last value after the session ends.
pub struct StatusTracker {
    session_id: String,
    tx: watch::Sender<SessionState>,
}

impl StatusTracker {
    pub fn new(session_id: String) -> Self {
        let (tx, _rx) = watch::channel(SessionState::Idle);
        Self { session_id, tx }
    }

    pub fn current(&self) -> SessionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn transition(&self, to: SessionState) {
        let from = self.tx.send_replace(to);
        if from != to {
            debug!("Session {}: {:?} → {:?}", self.session_id, from, to);
        }
    }

    pub fn fail(&self) {
        self.transition(SessionState::RequestFailed);
    }
}
