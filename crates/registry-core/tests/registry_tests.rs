//! Cross-registry behavior as the API layer uses it

use chrono::{Duration, Utc};
use fieldcall_capture_core::{CallRecord, CallType, StaffId, SyncState};
use fieldcall_registry_core::{
    CallLogLedger, CreateStaffRequest, ExcludedContactRegistry, HeartbeatStore, Role,
    StaffRegistry, SystemConfigRegistry,
};
use pretty_assertions::assert_eq;

fn staff_member(registry: &StaffRegistry, name: &str, phone: &str, role: Role) -> StaffId {
    registry
        .create(CreateStaffRequest {
            name: name.to_string(),
            phone: phone.to_string(),
            role,
        })
        .unwrap()
        .id
}

fn call(id: &str, staff: &StaffId, phone: &str) -> CallRecord {
    CallRecord {
        provider_call_id: id.to_string(),
        phone_number: phone.to_string(),
        contact_name: None,
        call_type: CallType::Outgoing,
        duration_seconds: 45,
        captured_at: Utc::now(),
        staff_id: staff.clone(),
        sync_state: SyncState::Pending,
    }
}

#[test]
fn test_reports_skip_excluded_numbers() {
    let staff = StaffRegistry::default();
    let excluded = ExcludedContactRegistry::default();
    let ledger = CallLogLedger::new();

    let ravi = staff_member(&staff, "Ravi", "9000000002", Role::Staff);
    excluded.add("+91 99887 76655", Some("Home".to_string())).unwrap();

    ledger
        .ingest(&[
            call("1", &ravi, "9988776655"),
            call("2", &ravi, "9123456789"),
        ])
        .unwrap();

    let reportable: Vec<String> = ledger
        .for_staff(&ravi)
        .into_iter()
        .filter(|c| !excluded.is_excluded(&c.phone_number))
        .map(|c| c.provider_call_id)
        .collect();
    assert_eq!(reportable, vec!["2".to_string()]);
}

#[test]
fn test_interval_change_and_liveness_dashboard() {
    let staff = StaffRegistry::default();
    let settings = SystemConfigRegistry::new();
    let heartbeats = HeartbeatStore::default();

    let admin_id = staff_member(&staff, "Meera", "9000000001", Role::Admin);
    let ravi = staff_member(&staff, "Ravi", "9000000002", Role::Staff);

    let admin = staff.get(&admin_id).unwrap();
    settings.update_sync_interval(&admin, "20").unwrap();
    assert_eq!(settings.sync_interval(), "20");

    let now = Utc::now();
    heartbeats.record(&ravi, now - Duration::seconds(30));
    let board = heartbeats.status(&staff.list_by_role(Role::Staff), now);
    assert_eq!(board.len(), 1);
    assert!(board[0].is_live);

    let json = serde_json::to_value(&board[0]).unwrap();
    assert_eq!(json["staff_name"], "Ravi");
}
