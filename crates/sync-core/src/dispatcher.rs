//! Single-flight upload of pending call records
//!
//! A run takes every PENDING record, submits them in one request and marks
//! them SYNCED only after the backend accepted the whole batch. Anything
//! short of that leaves the queue untouched for the next trigger.

use chrono::Utc;
use fieldcall_capture_core::{CallQueue, FieldcallConfig, SessionProvider};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::SyncError;
use crate::remote::IngestClient;

/// What started a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncTrigger {
    Timer,
    Foreground,
    Login,
    Manual,
    /// Immediate upload attempt right after a call was queued
    Capture,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncTrigger::Timer => "timer",
            SyncTrigger::Foreground => "foreground",
            SyncTrigger::Login => "login",
            SyncTrigger::Manual => "manual",
            SyncTrigger::Capture => "capture",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NoSession,
    SessionExpired,
    AlreadyRunning,
}

/// Result of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    /// Nothing was pending
    Idle,
    Synced { count: usize },
    /// The batch is still PENDING
    Failed { pending: usize, reason: String },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Idle | SyncOutcome::Synced { .. })
    }
}

const MAX_RETENTION_DAYS: u64 = 36_500;

/// Tunables for [`SyncDispatcher`]
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub request_timeout: Duration,
    /// SYNCED rows older than this are purged after a successful run
    pub retention: chrono::Duration,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self::from_config(&FieldcallConfig::default())
    }
}

impl DispatcherOptions {
    pub fn from_config(config: &FieldcallConfig) -> Self {
        let retention_days = config.sync.retention_days.min(MAX_RETENTION_DAYS) as i64;
        Self {
            request_timeout: Duration::from_secs(config.api.request_timeout_secs),
            retention: chrono::Duration::days(retention_days),
        }
    }
}

/// Clears the in-flight flag however the run ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncDispatcher {
    queue: Arc<dyn CallQueue>,
    ingest: Arc<dyn IngestClient>,
    sessions: Arc<dyn SessionProvider>,
    options: DispatcherOptions,
    in_flight: AtomicBool,
}

impl SyncDispatcher {
    pub fn new(
        queue: Arc<dyn CallQueue>,
        ingest: Arc<dyn IngestClient>,
        sessions: Arc<dyn SessionProvider>,
        options: DispatcherOptions,
    ) -> Self {
        Self {
            queue,
            ingest,
            sessions,
            options,
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a run is uploading
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn run_once(&self, trigger: SyncTrigger) -> SyncOutcome {
        let session = match self.sessions.current() {
            Some(session) => session,
            None => {
                debug!(%trigger, "No session, skipping sync");
                return SyncOutcome::Skipped(SkipReason::NoSession);
            }
        };
        if session.is_expired(Utc::now()) {
            debug!(%trigger, staff_id = %session.staff_id, "Session expired, skipping sync");
            return SyncOutcome::Skipped(SkipReason::SessionExpired);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(%trigger, "Sync already in flight");
            return SyncOutcome::Skipped(SkipReason::AlreadyRunning);
        }
        let _guard = InFlight(&self.in_flight);

        let batch = match self.queue.list_pending().await {
            Ok(batch) => batch,
            Err(e) => {
                error!(%trigger, error = %e, "Failed to read pending calls");
                return SyncOutcome::Failed {
                    pending: 0,
                    reason: e.to_string(),
                };
            }
        };
        if batch.is_empty() {
            debug!(%trigger, "Nothing to sync");
            return SyncOutcome::Idle;
        }

        let pending = batch.len();
        info!(%trigger, pending, "Uploading pending calls");

        let submitted = match tokio::time::timeout(
            self.options.request_timeout,
            self.ingest.submit(&session, &batch),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout {
                secs: self.options.request_timeout.as_secs(),
            }),
        };

        if let Err(e) = submitted {
            warn!(%trigger, pending, retryable = e.is_retryable(), error = %e, "Sync failed, calls stay pending");
            return SyncOutcome::Failed {
                pending,
                reason: e.to_string(),
            };
        }

        let ids: Vec<String> = batch.into_iter().map(|r| r.provider_call_id).collect();
        let count = match self.queue.mark_synced(&ids).await {
            Ok(marked) => {
                debug!(marked, "Calls marked synced");
                ids.len()
            }
            Err(e) => {
                // Backend dedupes on (call id, staff id); the next run resends.
                error!(%trigger, pending, error = %e, "Upload accepted but marking failed");
                return SyncOutcome::Failed {
                    pending,
                    reason: e.to_string(),
                };
            }
        };

        self.purge_expired().await;

        info!(%trigger, count, "Sync complete");
        SyncOutcome::Synced { count }
    }

    async fn purge_expired(&self) {
        let cutoff = Utc::now() - self.options.retention;
        match self.queue.purge_synced_older_than(cutoff).await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Purged old synced calls"),
            Err(e) => warn!(error = %e, "Retention purge failed"),
        }
    }
}
