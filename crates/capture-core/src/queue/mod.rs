//! Local durable queue of captured calls
//!
//! The queue is the hand-off point between the capturer (writer of new
//! records) and the sync dispatcher (reader of pending records, writer of the
//! synced flag). It must survive process restarts, so the default backend is
//! SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::CallRecord;

mod sqlite;

pub use sqlite::{SqliteCallQueue, SqlitePreferences};

/// Storage interface for captured call records
#[async_trait]
pub trait CallQueue: Send + Sync {
    /// Insert a record unless its provider call id is already queued.
    ///
    /// Returns `true` when a new row was created. A conflict leaves the
    /// existing row untouched and is not an error.
    async fn insert(&self, record: &CallRecord) -> Result<bool>;

    /// All PENDING records, oldest capture first
    async fn list_pending(&self) -> Result<Vec<CallRecord>>;

    /// Flip the given records to SYNCED in one transaction.
    ///
    /// Already-synced and unknown ids are ignored. Returns how many rows
    /// changed state.
    async fn mark_synced(&self, provider_call_ids: &[String]) -> Result<u64>;

    /// Delete SYNCED records captured before `cutoff`
    async fn purge_synced_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Most recent records regardless of sync state, newest first
    async fn recent(&self, limit: u32) -> Result<Vec<CallRecord>>;

    async fn pending_count(&self) -> Result<u64>;

    async fn len(&self) -> Result<u64>;
}
