//! SQLite storage for the call queue

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::CallQueue;
use crate::error::{CaptureError, Result};
use crate::types::{CallRecord, CallType, StaffId, SyncState};

const RECORD_COLUMNS: &str = "provider_call_id, phone_number, contact_name, call_type, \
     duration_seconds, captured_at, staff_id, sync_state";

/// SQLite-backed call queue
#[derive(Clone)]
pub struct SqliteCallQueue {
    pool: SqlitePool,
    /// Serializes writers sharing this pool
    write_lock: Arc<Mutex<()>>,
}

impl SqliteCallQueue {
    /// Open (creating if needed) the database at `database_url` and apply the schema
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is a separate database, so keep exactly one alive.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(4)
                .connect_with(options)
                .await?
        };

        let queue = Self::from_pool(pool).await?;
        info!("Call queue opened at {}", database_url);
        Ok(queue)
    }

    /// Wrap an existing pool and apply the schema
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let migration_sql = include_str!("../../migrations/001_call_queue.sql");
        sqlx::raw_sql(migration_sql).execute(&pool).await?;

        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Key/value preferences stored in the same database
    pub fn preferences(&self) -> SqlitePreferences {
        SqlitePreferences {
            pool: self.pool.clone(),
        }
    }

    fn row_to_record(row: SqliteRow) -> Result<CallRecord> {
        let duration: i64 = row.try_get("duration_seconds")?;
        let captured_at_ms: i64 = row.try_get("captured_at")?;
        let call_type: String = row.try_get("call_type")?;
        let sync_state: String = row.try_get("sync_state")?;
        let staff_id: String = row.try_get("staff_id")?;

        Ok(CallRecord {
            provider_call_id: row.try_get("provider_call_id")?,
            phone_number: row.try_get("phone_number")?,
            contact_name: row.try_get("contact_name")?,
            call_type: CallType::from_str(&call_type)?,
            duration_seconds: u64::try_from(duration)
                .map_err(|_| CaptureError::CorruptRow(format!("negative duration {duration}")))?,
            captured_at: DateTime::<Utc>::from_timestamp_millis(captured_at_ms).ok_or_else(|| {
                CaptureError::CorruptRow(format!("timestamp out of range {captured_at_ms}"))
            })?,
            staff_id: StaffId(staff_id),
            sync_state: SyncState::from_str(&sync_state)?,
        })
    }
}

#[async_trait]
impl CallQueue for SqliteCallQueue {
    async fn insert(&self, record: &CallRecord) -> Result<bool> {
        if record.staff_id.as_str().is_empty() {
            return Err(CaptureError::InvalidRecord(format!(
                "record {} has no staff id",
                record.provider_call_id
            )));
        }
        let duration = i64::try_from(record.duration_seconds).map_err(|_| {
            CaptureError::InvalidRecord(format!("duration {} too large", record.duration_seconds))
        })?;

        let _guard = self.write_lock.lock().await;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO call_logs
             (provider_call_id, phone_number, contact_name, call_type, duration_seconds,
              captured_at, staff_id, sync_state)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.provider_call_id)
        .bind(&record.phone_number)
        .bind(&record.contact_name)
        .bind(record.call_type.as_str())
        .bind(duration)
        .bind(record.captured_at.timestamp_millis())
        .bind(record.staff_id.as_str())
        .bind(record.sync_state.as_str())
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            debug!(provider_call_id = %record.provider_call_id, "Queued call record");
        } else {
            debug!(provider_call_id = %record.provider_call_id, "Call record already queued");
        }
        Ok(inserted)
    }

    async fn list_pending(&self) -> Result<Vec<CallRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM call_logs
             WHERE sync_state = 'PENDING'
             ORDER BY captured_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn mark_synced(&self, provider_call_ids: &[String]) -> Result<u64> {
        if provider_call_ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut total_updated = 0;

        for id in provider_call_ids {
            let result = sqlx::query(
                "UPDATE call_logs SET sync_state = 'SYNCED'
                 WHERE provider_call_id = ? AND sync_state = 'PENDING'",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;

            total_updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!("Marked {} of {} records synced", total_updated, provider_call_ids.len());
        Ok(total_updated)
    }

    async fn purge_synced_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query(
            "DELETE FROM call_logs WHERE sync_state = 'SYNCED' AND captured_at < ?",
        )
        .bind(cutoff.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<CallRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM call_logs
             ORDER BY captured_at DESC, id DESC
             LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn pending_count(&self) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM call_logs WHERE sync_state = 'PENDING'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM call_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

/// Device-local key/value settings
#[derive(Clone)]
pub struct SqlitePreferences {
    pool: SqlitePool,
}

impl SqlitePreferences {
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a key; returns whether it existed
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(id: &str, minutes_ago: i64) -> CallRecord {
        CallRecord {
            provider_call_id: id.to_string(),
            phone_number: "+919812345678".to_string(),
            contact_name: None,
            call_type: CallType::Outgoing,
            duration_seconds: 12,
            captured_at: Utc::now() - Duration::minutes(minutes_ago),
            staff_id: StaffId::new("staff-7"),
            sync_state: SyncState::Pending,
        }
    }

    #[tokio::test]
    async fn test_memory_queue_roundtrip() {
        let queue = SqliteCallQueue::new("sqlite::memory:").await.unwrap();

        assert!(queue.insert(&record("a", 5)).await.unwrap());
        assert_eq!(queue.len().await.unwrap(), 1);

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].provider_call_id, "a");
        assert_eq!(pending[0].call_type, CallType::Outgoing);
    }

    #[tokio::test]
    async fn test_insert_rejects_missing_staff() {
        let queue = SqliteCallQueue::new("sqlite::memory:").await.unwrap();
        let mut orphan = record("b", 1);
        orphan.staff_id = StaffId::new("");

        let err = queue.insert(&orphan).await.unwrap_err();
        assert!(matches!(err, CaptureError::InvalidRecord(_)));
        assert!(!err.is_retryable());
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preferences_upsert() {
        let queue = SqliteCallQueue::new("sqlite::memory:").await.unwrap();
        let prefs = queue.preferences();

        assert_eq!(prefs.get("sync_interval_minutes").await.unwrap(), None);
        prefs.set("sync_interval_minutes", "15").await.unwrap();
        prefs.set("sync_interval_minutes", "30").await.unwrap();
        assert_eq!(
            prefs.get("sync_interval_minutes").await.unwrap().as_deref(),
            Some("30")
        );
    }

    #[tokio::test]
    async fn test_preferences_remove() {
        let queue = SqliteCallQueue::new("sqlite::memory:").await.unwrap();
        let prefs = queue.preferences();

        prefs.set("session", "{}").await.unwrap();
        assert!(prefs.remove("session").await.unwrap());
        assert!(!prefs.remove("session").await.unwrap());
        assert_eq!(prefs.get("session").await.unwrap(), None);
    }
}
