//! Call capturer: telephony events in, queued call records out

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::call_log::CallLogProvider;
use super::state::{CallStateMachine, CompletedCall, TelephonyEvent, Transition};
use crate::config::{CaptureConfig, MAX_LOOKUP_WINDOW_SECS};
use crate::error::Result;
use crate::queue::CallQueue;
use crate::session::SessionProvider;
use crate::types::{CallLogEntry, CallRecord, CallType};

/// What a single telephony event led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Call is in progress; nothing recorded yet
    InProgress,
    /// Event did not change the tracked call
    Ignored,
    /// A new record was written to the queue
    Queued(CallRecord),
    /// The call-log entry was already queued
    Duplicate(String),
    /// Nobody is logged in; the call was dropped
    NoSession,
    /// No matching call-log entry within the lookup window; the call is lost
    LookupMiss,
}

/// Materializes one queued record per real call
pub struct CallCapturer {
    machine: CallStateMachine,
    queue: Arc<dyn CallQueue>,
    call_log: Arc<dyn CallLogProvider>,
    sessions: Arc<dyn SessionProvider>,
    lookup_window: Duration,
}

impl CallCapturer {
    pub fn new(
        queue: Arc<dyn CallQueue>,
        call_log: Arc<dyn CallLogProvider>,
        sessions: Arc<dyn SessionProvider>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            machine: CallStateMachine::new(),
            queue,
            call_log,
            sessions,
            lookup_window: Duration::seconds(config.lookup_window_secs.min(MAX_LOOKUP_WINDOW_SECS) as i64),
        }
    }

    pub fn state_machine(&self) -> &CallStateMachine {
        &self.machine
    }

    /// Process one OS callback to completion.
    ///
    /// Taking `&mut self` keeps callbacks strictly sequential.
    pub async fn handle(&mut self, event: &TelephonyEvent) -> Result<CaptureOutcome> {
        match self.machine.on_event(event) {
            Transition::Ringing | Transition::Activated { .. } => Ok(CaptureOutcome::InProgress),
            Transition::Ignored => Ok(CaptureOutcome::Ignored),
            Transition::Ended(call) => self.record_completed(call).await,
        }
    }

    async fn record_completed(&self, call: CompletedCall) -> Result<CaptureOutcome> {
        // An expired session still identifies the operator; only upload waits for re-auth.
        let Some(session) = self.sessions.current() else {
            warn!("User not logged in, skipping call capture");
            return Ok(CaptureOutcome::NoSession);
        };

        let Some(entry) = self.lookup_entry(&call).await? else {
            warn!(
                started_at = %call.started_at,
                ended_at = %call.ended_at,
                "No call-log entry found for completed call"
            );
            return Ok(CaptureOutcome::LookupMiss);
        };

        let mut record = CallRecord::from_entry(&entry, session.staff_id);
        if !call.went_active {
            record.call_type = CallType::Missed;
            record.duration_seconds = 0;
        }
        debug!(
            provider_call_id = %record.provider_call_id,
            reported_secs = record.duration_seconds,
            elapsed_secs = call.elapsed.num_seconds(),
            "Resolved call-log entry"
        );

        match self.queue.insert(&record).await {
            Ok(true) => {
                info!(
                    provider_call_id = %record.provider_call_id,
                    call_type = %record.call_type,
                    duration = record.duration_seconds,
                    "Call saved to queue"
                );
                Ok(CaptureOutcome::Queued(record))
            }
            Ok(false) => Ok(CaptureOutcome::Duplicate(record.provider_call_id)),
            Err(e) => {
                error!(provider_call_id = %record.provider_call_id, "Failed to queue call: {}", e);
                Err(e)
            }
        }
    }

    /// Most recent call-log entry that started inside the lookup window
    async fn lookup_entry(&self, call: &CompletedCall) -> Result<Option<CallLogEntry>> {
        let since = call.started_at - self.lookup_window;
        let entries = self.call_log.entries_since(since).await.map_err(|e| {
            error!("Error reading call log: {}", e);
            e
        })?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.date > since && entry.date <= call.ended_at)
            .max_by_key(|entry| entry.date))
    }
}
