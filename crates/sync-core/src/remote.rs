//! Backend endpoints used by the device
//!
//! Three narrow traits, one per endpoint, so the dispatcher and the service
//! can run against the HTTP backend or against the in-process registries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldcall_capture_core::{ApiConfig, CallRecord, CallType, Session, StaffId};
use fieldcall_registry_core::{CallLogLedger, HeartbeatStore, SystemConfigRegistry};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SyncError};

/// Accepts a batch of call records, all or nothing
#[async_trait]
pub trait IngestClient: Send + Sync {
    async fn submit(&self, session: &Session, batch: &[CallRecord]) -> Result<()>;
}

/// Source of the administrator-controlled sync interval
#[async_trait]
pub trait IntervalSource: Send + Sync {
    /// Interval in minutes, as the backend stores it
    async fn fetch_sync_interval(&self, session: &Session) -> Result<String>;
}

/// Receives device liveness pings
#[async_trait]
pub trait HeartbeatSink: Send + Sync {
    async fn send_heartbeat(&self, session: &Session) -> Result<()>;
}

/// One call as the ingest endpoint expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogPayload {
    pub phone_number: String,
    pub call_type: CallType,
    pub duration: u64,
    pub contact_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub staff_id: StaffId,
    pub phone_call_id: String,
}

impl From<&CallRecord> for CallLogPayload {
    fn from(record: &CallRecord) -> Self {
        Self {
            phone_number: record.phone_number.clone(),
            call_type: record.call_type,
            duration: record.duration_seconds,
            contact_name: record.contact_name.clone(),
            timestamp: record.captured_at,
            staff_id: record.staff_id.clone(),
            phone_call_id: record.provider_call_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntervalResponse {
    value: String,
}

/// reqwest client for the fieldcall backend
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(SyncError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl IngestClient for HttpApiClient {
    async fn submit(&self, session: &Session, batch: &[CallRecord]) -> Result<()> {
        let payload: Vec<CallLogPayload> = batch.iter().map(CallLogPayload::from).collect();

        let response = self
            .client
            .post(self.url("/call-logs"))
            .bearer_auth(&session.token)
            .json(&payload)
            .send()
            .await?;
        Self::check(response)?;

        debug!(count = payload.len(), "Call-log batch accepted by backend");
        Ok(())
    }
}

#[async_trait]
impl IntervalSource for HttpApiClient {
    async fn fetch_sync_interval(&self, session: &Session) -> Result<String> {
        let response = self
            .client
            .get(self.url("/settings/sync-interval"))
            .bearer_auth(&session.token)
            .send()
            .await?;
        let body: IntervalResponse = Self::check(response)?.json().await?;
        Ok(body.value)
    }
}

#[async_trait]
impl HeartbeatSink for HttpApiClient {
    async fn send_heartbeat(&self, session: &Session) -> Result<()> {
        let response = self
            .client
            .post(self.url("/heartbeat"))
            .bearer_auth(&session.token)
            .send()
            .await?;
        Self::check(response)?;
        Ok(())
    }
}

#[async_trait]
impl IngestClient for CallLogLedger {
    async fn submit(&self, _session: &Session, batch: &[CallRecord]) -> Result<()> {
        self.ingest(batch)?;
        Ok(())
    }
}

#[async_trait]
impl IntervalSource for SystemConfigRegistry {
    async fn fetch_sync_interval(&self, _session: &Session) -> Result<String> {
        Ok(self.sync_interval())
    }
}

#[async_trait]
impl HeartbeatSink for HeartbeatStore {
    async fn send_heartbeat(&self, session: &Session) -> Result<()> {
        self.record(&session.staff_id, Utc::now());
        Ok(())
    }
}
