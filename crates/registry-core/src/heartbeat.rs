//! Device heartbeats and staff liveness
//!
//! Created once per process and shared by handle; each test builds its own.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use fieldcall_capture_core::StaffId;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

use crate::staff::StaffAccount;

/// How recent a heartbeat must be, in seconds, for a device to count as live
pub const DEFAULT_LIVE_WINDOW_SECS: i64 = 120;

/// Liveness of one staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffLiveness {
    pub staff_id: StaffId,
    pub staff_name: String,
    pub is_live: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

/// Last heartbeat per staff id
#[derive(Clone)]
pub struct HeartbeatStore {
    heartbeats: Arc<DashMap<StaffId, DateTime<Utc>>>,
    live_window: Duration,
}

impl Default for HeartbeatStore {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_LIVE_WINDOW_SECS))
    }
}

impl HeartbeatStore {
    pub fn new(live_window: Duration) -> Self {
        Self {
            heartbeats: Arc::new(DashMap::new()),
            live_window,
        }
    }

    /// Record a heartbeat; an older timestamp never replaces a newer one
    pub fn record(&self, staff_id: &StaffId, at: DateTime<Utc>) {
        self.heartbeats
            .entry(staff_id.clone())
            .and_modify(|last| {
                if at > *last {
                    *last = at;
                }
            })
            .or_insert(at);
        trace!(staff_id = %staff_id, "Heartbeat recorded");
    }

    pub fn last(&self, staff_id: &StaffId) -> Option<DateTime<Utc>> {
        self.heartbeats.get(staff_id).map(|at| *at)
    }

    pub fn is_live(&self, staff_id: &StaffId, now: DateTime<Utc>) -> bool {
        self.last(staff_id)
            .is_some_and(|at| at > now - self.live_window)
    }

    /// Liveness of the given accounts, most recent heartbeat first
    pub fn status(&self, staff: &[StaffAccount], now: DateTime<Utc>) -> Vec<StaffLiveness> {
        let mut statuses: Vec<StaffLiveness> = staff
            .iter()
            .map(|account| {
                let last_heartbeat = self.last(&account.id);
                StaffLiveness {
                    staff_id: account.id.clone(),
                    staff_name: account.name.clone(),
                    is_live: last_heartbeat.is_some_and(|at| at > now - self.live_window),
                    last_heartbeat,
                }
            })
            .collect();

        statuses.sort_by(|a, b| b.last_heartbeat.cmp(&a.last_heartbeat));
        statuses
    }

    pub fn clear(&self, staff_id: &StaffId) {
        self.heartbeats.remove(staff_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staff::{CreateStaffRequest, Role, StaffRegistry};

    #[test]
    fn test_liveness_window() {
        let store = HeartbeatStore::default();
        let now = Utc::now();
        let id = StaffId::new("s1");

        assert!(!store.is_live(&id, now));
        store.record(&id, now - Duration::seconds(90));
        assert!(store.is_live(&id, now));
        assert!(!store.is_live(&id, now + Duration::seconds(31)));
    }

    #[test]
    fn test_older_heartbeat_is_ignored() {
        let store = HeartbeatStore::default();
        let now = Utc::now();
        let id = StaffId::new("s1");

        store.record(&id, now);
        store.record(&id, now - Duration::minutes(10));
        assert_eq!(store.last(&id), Some(now));
    }

    #[test]
    fn test_status_sorted_by_recency() {
        let staff = StaffRegistry::default();
        let mk = |name: &str, phone: &str| {
            staff
                .create(CreateStaffRequest {
                    name: name.to_string(),
                    phone: phone.to_string(),
                    role: Role::Staff,
                })
                .unwrap()
        };
        let a = mk("A", "9000000001");
        let b = mk("B", "9000000002");
        let c = mk("C", "9000000003");

        let store = HeartbeatStore::default();
        let now = Utc::now();
        store.record(&a.id, now - Duration::minutes(5));
        store.record(&b.id, now - Duration::seconds(10));

        let status = store.status(&[a.clone(), b.clone(), c.clone()], now);
        let order: Vec<&str> = status.iter().map(|s| s.staff_name.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert!(status[0].is_live);
        assert!(!status[1].is_live);
        assert_eq!(status[2].last_heartbeat, None);
    }
}
