//! Current authenticated session as seen by the capturer and the dispatcher

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::types::StaffId;

/// Authenticated operator session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub staff_id: StaffId,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>, staff_id: StaffId) -> Self {
        Self {
            token: token.into(),
            staff_id,
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Read access to the current session
pub trait SessionProvider: Send + Sync {
    /// Snapshot of the current session, `None` when logged out
    fn current(&self) -> Option<Session>;
}

/// Observable session holder backed by a watch channel
#[derive(Clone)]
pub struct SessionHandle {
    tx: watch::Sender<Option<Session>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn login(&self, session: Session) {
        info!(staff_id = %session.staff_id, "Session started");
        self.tx.send_replace(Some(session));
    }

    pub fn logout(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("Session ended");
        }
    }

    /// Receive every login and logout
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl SessionProvider for SessionHandle {
    fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }
}
