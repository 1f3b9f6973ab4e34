//! Device call-log access

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{CaptureError, Result};
use crate::types::CallLogEntry;

/// Read-only view of the device call log
#[async_trait]
pub trait CallLogProvider: Send + Sync {
    /// Entries whose call start is after `since`, in any order
    async fn entries_since(&self, since: DateTime<Utc>) -> Result<Vec<CallLogEntry>>;
}

/// In-memory call log, filled by hand or from a snapshot file
#[derive(Clone, Default)]
pub struct StaticCallLog {
    entries: Arc<RwLock<Vec<CallLogEntry>>>,
}

impl StaticCallLog {
    pub fn new(entries: Vec<CallLogEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Load a JSON array of entries
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CallLogEntry> = serde_json::from_str(json)
            .map_err(|e| CaptureError::CallLog(format!("unreadable call-log snapshot: {e}")))?;
        Ok(Self::new(entries))
    }

    pub fn push(&self, entry: CallLogEntry) {
        self.entries.write().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[async_trait]
impl CallLogProvider for StaticCallLog {
    async fn entries_since(&self, since: DateTime<Utc>) -> Result<Vec<CallLogEntry>> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|entry| entry.date > since)
            .cloned()
            .collect())
    }
}
