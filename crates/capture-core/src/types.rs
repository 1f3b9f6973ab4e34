//! Core types for capture-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CaptureError;

/// Identifier of the authenticated operator whose device captured a call
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub String);

impl StaffId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StaffId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Call direction as reported by the device call log
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallType {
    Incoming,
    Outgoing,
    Missed,
    Unknown,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Incoming => "INCOMING",
            CallType::Outgoing => "OUTGOING",
            CallType::Missed => "MISSED",
            CallType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallType {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOMING" => Ok(CallType::Incoming),
            "OUTGOING" => Ok(CallType::Outgoing),
            "MISSED" => Ok(CallType::Missed),
            "UNKNOWN" => Ok(CallType::Unknown),
            other => Err(CaptureError::CorruptRow(format!("unknown call type {other:?}"))),
        }
    }
}

/// Upload state of a queued record
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    Pending,
    Synced,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Pending => "PENDING",
            SyncState::Synced => "SYNCED",
        }
    }
}

impl FromStr for SyncState {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SyncState::Pending),
            "SYNCED" => Ok(SyncState::Synced),
            other => Err(CaptureError::CorruptRow(format!("unknown sync state {other:?}"))),
        }
    }
}

/// One phone call observed on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Call-log identifier assigned by the OS; unique in the local queue
    pub provider_call_id: String,
    /// Number as reported by the OS, not normalized
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub call_type: CallType,
    pub duration_seconds: u64,
    /// Call start, assigned once at capture
    pub captured_at: DateTime<Utc>,
    pub staff_id: StaffId,
    pub sync_state: SyncState,
}

impl CallRecord {
    /// Build a new PENDING record from a completed call-log entry
    pub fn from_entry(entry: &CallLogEntry, staff_id: StaffId) -> Self {
        Self {
            provider_call_id: entry.id.clone(),
            phone_number: entry.number.clone(),
            contact_name: entry.cached_name.clone(),
            call_type: entry.call_type,
            duration_seconds: entry.duration_seconds,
            captured_at: entry.date,
            staff_id,
            sync_state: SyncState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.sync_state == SyncState::Pending
    }
}

/// A row of the device call log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub id: String,
    pub number: String,
    pub call_type: CallType,
    /// Call start
    pub date: DateTime<Utc>,
    pub duration_seconds: u64,
    pub cached_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_type_wire_names() {
        assert_eq!(serde_json::to_string(&CallType::Missed).unwrap(), "\"MISSED\"");
        assert_eq!("OUTGOING".parse::<CallType>().unwrap(), CallType::Outgoing);
        assert!("REJECTED".parse::<CallType>().is_err());
    }

    #[test]
    fn record_from_entry_starts_pending() {
        let entry = CallLogEntry {
            id: "42".to_string(),
            number: "+919876543210".to_string(),
            call_type: CallType::Incoming,
            date: Utc::now(),
            duration_seconds: 37,
            cached_name: Some("Ravi".to_string()),
        };

        let record = CallRecord::from_entry(&entry, StaffId::new("staff-1"));

        assert_eq!(record.provider_call_id, "42");
        assert_eq!(record.duration_seconds, 37);
        assert_eq!(record.captured_at, entry.date);
        assert!(record.is_pending());
    }
}
