//! Server-side call-log ledger
//!
//! Accepts batches uploaded by devices. Uploads are at-least-once, so a batch
//! may repeat records already stored; the ledger keeps exactly one copy per
//! `(provider_call_id, staff_id)`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fieldcall_capture_core::{CallRecord, StaffId, SyncState};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{RegistryError, Result};

type LedgerKey = (String, StaffId);

/// Result of ingesting one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub accepted: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone)]
struct StoredCall {
    record: CallRecord,
    received_at: DateTime<Utc>,
}

/// Idempotent store of uploaded call records
#[derive(Clone, Default)]
pub struct CallLogLedger {
    calls: Arc<DashMap<LedgerKey, StoredCall>>,
    /// Remaining batches to refuse, for exercising client retry paths
    reject_budget: Arc<AtomicUsize>,
    batches_seen: Arc<AtomicUsize>,
}

impl CallLogLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a batch. Either every record is durably accepted or none is.
    pub fn ingest(&self, batch: &[CallRecord]) -> Result<IngestSummary> {
        self.batches_seen.fetch_add(1, Ordering::SeqCst);

        let refused = self
            .reject_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            warn!(size = batch.len(), "Refusing call-log batch");
            return Err(RegistryError::Unavailable("ingest temporarily refused".to_string()));
        }

        if let Some(bad) = batch.iter().find(|r| r.staff_id.as_str().is_empty()) {
            return Err(RegistryError::Validation(format!(
                "call {} has no staff id",
                bad.provider_call_id
            )));
        }

        let now = Utc::now();
        let mut summary = IngestSummary {
            accepted: 0,
            duplicates: 0,
        };

        for record in batch {
            let key = (record.provider_call_id.clone(), record.staff_id.clone());
            let mut inserted = false;
            self.calls.entry(key).or_insert_with(|| {
                inserted = true;
                let mut stored = record.clone();
                stored.sync_state = SyncState::Synced;
                StoredCall {
                    record: stored,
                    received_at: now,
                }
            });

            if inserted {
                summary.accepted += 1;
            } else {
                summary.duplicates += 1;
            }
        }

        info!(
            accepted = summary.accepted,
            duplicates = summary.duplicates,
            "Call-log batch ingested"
        );
        Ok(summary)
    }

    /// Refuse the next `batches` ingest calls
    pub fn reject_next(&self, batches: usize) {
        self.reject_budget.store(batches, Ordering::SeqCst);
    }

    /// Number of ingest calls, accepted or refused
    pub fn batches_seen(&self) -> usize {
        self.batches_seen.load(Ordering::SeqCst)
    }

    /// Calls uploaded by one staff member, newest first
    pub fn for_staff(&self, staff_id: &StaffId) -> Vec<CallRecord> {
        self.collect(|record| &record.staff_id == staff_id)
    }

    /// Every stored call, newest first
    pub fn all(&self) -> Vec<CallRecord> {
        self.collect(|_| true)
    }

    /// When the ledger first received this call
    pub fn received_at(&self, provider_call_id: &str, staff_id: &StaffId) -> Option<DateTime<Utc>> {
        self.calls
            .get(&(provider_call_id.to_string(), staff_id.clone()))
            .map(|stored| stored.received_at)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn collect(&self, keep: impl Fn(&CallRecord) -> bool) -> Vec<CallRecord> {
        let mut records: Vec<CallRecord> = self
            .calls
            .iter()
            .filter(|entry| keep(&entry.record))
            .map(|entry| entry.record.clone())
            .collect();
        records.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fieldcall_capture_core::CallType;

    fn record(id: &str, staff: &str, minutes_ago: i64) -> CallRecord {
        CallRecord {
            provider_call_id: id.to_string(),
            phone_number: "9876543210".to_string(),
            contact_name: None,
            call_type: CallType::Incoming,
            duration_seconds: 30,
            captured_at: Utc::now() - Duration::minutes(minutes_ago),
            staff_id: StaffId::new(staff),
            sync_state: SyncState::Pending,
        }
    }

    #[test]
    fn test_repeated_batch_is_idempotent() {
        let ledger = CallLogLedger::new();
        let batch = vec![record("1", "s1", 3), record("2", "s1", 2)];

        assert_eq!(
            ledger.ingest(&batch).unwrap(),
            IngestSummary { accepted: 2, duplicates: 0 }
        );
        assert_eq!(
            ledger.ingest(&batch).unwrap(),
            IngestSummary { accepted: 0, duplicates: 2 }
        );
        assert_eq!(ledger.len(), 2);
        assert!(ledger.all().iter().all(|r| r.sync_state == SyncState::Synced));
    }

    #[test]
    fn test_same_call_id_from_two_devices() {
        let ledger = CallLogLedger::new();
        ledger.ingest(&[record("7", "s1", 1), record("7", "s2", 1)]).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.for_staff(&StaffId::new("s2")).len(), 1);
        assert!(ledger.received_at("7", &StaffId::new("s1")).is_some());
    }

    #[test]
    fn test_rejection_budget() {
        let ledger = CallLogLedger::new();
        ledger.reject_next(1);

        assert!(matches!(
            ledger.ingest(&[record("1", "s1", 1)]),
            Err(RegistryError::Unavailable(_))
        ));
        assert!(ledger.is_empty());
        assert!(ledger.ingest(&[record("1", "s1", 1)]).is_ok());
        assert_eq!(ledger.batches_seen(), 2);
    }

    #[test]
    fn test_batch_without_staff_is_rejected_whole() {
        let ledger = CallLogLedger::new();
        let result = ledger.ingest(&[record("1", "s1", 1), record("2", "", 1)]);

        assert!(matches!(result, Err(RegistryError::Validation(_))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_newest_first() {
        let ledger = CallLogLedger::new();
        ledger
            .ingest(&[record("old", "s1", 30), record("new", "s1", 1)])
            .unwrap();
        let ids: Vec<String> = ledger.all().into_iter().map(|r| r.provider_call_id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
