//! Tests for the durable call queue

use chrono::{Duration, TimeZone, Utc};
use fieldcall_capture_core::{CallQueue, CallRecord, CallType, SqliteCallQueue, StaffId, SyncState};
use tempfile::TempDir;

/// Helper to create an on-disk queue
async fn create_test_queue() -> (SqliteCallQueue, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("queue.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let queue = SqliteCallQueue::new(&db_url)
        .await
        .expect("Failed to create test queue");

    (queue, temp_dir)
}

fn record(id: &str, minute: u32) -> CallRecord {
    CallRecord {
        provider_call_id: id.to_string(),
        phone_number: format!("+9198765{:05}", minute),
        contact_name: Some(format!("Customer {id}")),
        call_type: CallType::Incoming,
        duration_seconds: 45,
        captured_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
        staff_id: StaffId::new("staff-1"),
        sync_state: SyncState::Pending,
    }
}

fn ids(records: &[CallRecord]) -> Vec<String> {
    records.iter().map(|r| r.provider_call_id.clone()).collect()
}

#[tokio::test]
async fn test_duplicate_insert_is_noop() {
    let (queue, _temp_dir) = create_test_queue().await;

    assert!(queue.insert(&record("call-1", 0)).await.unwrap());
    queue.mark_synced(&["call-1".to_string()]).await.unwrap();

    // same provider id with different content
    let mut again = record("call-1", 5);
    again.duration_seconds = 999;
    assert!(!queue.insert(&again).await.unwrap());

    assert_eq!(queue.len().await.unwrap(), 1);
    let stored = queue.recent(10).await.unwrap();
    assert_eq!(stored[0].sync_state, SyncState::Synced);
    assert_eq!(stored[0].duration_seconds, 45);
}

#[tokio::test]
async fn test_pending_is_ordered_by_capture_time() {
    let (queue, _temp_dir) = create_test_queue().await;

    queue.insert(&record("late", 30)).await.unwrap();
    queue.insert(&record("early", 1)).await.unwrap();
    queue.insert(&record("middle", 15)).await.unwrap();

    let pending = queue.list_pending().await.unwrap();
    assert_eq!(ids(&pending), vec!["early", "middle", "late"]);
}

#[tokio::test]
async fn test_mark_synced_is_idempotent() {
    let (queue, _temp_dir) = create_test_queue().await;
    for (i, id) in ["a", "b", "c"].iter().enumerate() {
        queue.insert(&record(id, i as u32)).await.unwrap();
    }

    let batch = vec!["a".to_string(), "b".to_string()];
    assert_eq!(queue.mark_synced(&batch).await.unwrap(), 2);
    let after_first = queue.recent(10).await.unwrap();

    assert_eq!(queue.mark_synced(&batch).await.unwrap(), 0);
    let after_second = queue.recent(10).await.unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(ids(&queue.list_pending().await.unwrap()), vec!["c"]);
    assert_eq!(queue.pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_mark_synced_ignores_unknown_ids() {
    let (queue, _temp_dir) = create_test_queue().await;
    queue.insert(&record("known", 0)).await.unwrap();

    let changed = queue
        .mark_synced(&["known".to_string(), "ghost".to_string()])
        .await
        .unwrap();

    assert_eq!(changed, 1);
    assert_eq!(queue.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_purge_only_removes_old_synced_rows() {
    let (queue, _temp_dir) = create_test_queue().await;

    queue.insert(&record("old-synced", 0)).await.unwrap();
    queue.insert(&record("old-pending", 1)).await.unwrap();
    queue.insert(&record("new-synced", 50)).await.unwrap();
    queue
        .mark_synced(&["old-synced".to_string(), "new-synced".to_string()])
        .await
        .unwrap();

    let cutoff = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
    assert_eq!(queue.purge_synced_older_than(cutoff).await.unwrap(), 1);

    let mut remaining = ids(&queue.recent(10).await.unwrap());
    remaining.sort();
    assert_eq!(remaining, vec!["new-synced", "old-pending"]);
}

#[tokio::test]
async fn test_queue_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("q.db").display());

    {
        let queue = SqliteCallQueue::new(&db_url).await.unwrap();
        queue.insert(&record("persisted", 3)).await.unwrap();
        queue.pool().close().await;
    }

    let reopened = SqliteCallQueue::new(&db_url).await.unwrap();
    let pending = reopened.list_pending().await.unwrap();
    assert_eq!(ids(&pending), vec!["persisted"]);
    assert_eq!(pending[0].contact_name.as_deref(), Some("Customer persisted"));
    assert_eq!(pending[0].captured_at, Utc.with_ymd_and_hms(2024, 3, 1, 10, 3, 0).unwrap());
}

#[tokio::test]
async fn test_recent_is_newest_first_and_limited() {
    let (queue, _temp_dir) = create_test_queue().await;
    for minute in 0..5 {
        queue.insert(&record(&format!("r{minute}"), minute)).await.unwrap();
    }

    let recent = queue.recent(3).await.unwrap();
    assert_eq!(ids(&recent), vec!["r4", "r3", "r2"]);

    let cutoff = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap() + Duration::days(1);
    // nothing is synced, so nothing is purged
    assert_eq!(queue.purge_synced_older_than(cutoff).await.unwrap(), 0);
}
