//! Terminal rendering

use colored::Colorize;
use fieldcall::prelude::*;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct CallRow {
    #[tabled(rename = "Call ID")]
    id: String,
    #[tabled(rename = "Number")]
    phone: String,
    #[tabled(rename = "Contact")]
    contact: String,
    #[tabled(rename = "Type")]
    call_type: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&CallRecord> for CallRow {
    fn from(record: &CallRecord) -> Self {
        Self {
            id: record.provider_call_id.clone(),
            phone: record.phone_number.clone(),
            contact: record.contact_name.clone().unwrap_or_else(|| "-".to_string()),
            call_type: record.call_type.to_string(),
            duration: format!("{}s", record.duration_seconds),
            started: record.captured_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            state: record.sync_state.as_str().to_string(),
        }
    }
}

pub fn print_calls(records: &[CallRecord]) {
    if records.is_empty() {
        println!("{}", "No calls".dimmed());
        return;
    }

    let rows: Vec<CallRow> = records.iter().map(CallRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

pub fn print_outcome(outcome: &SyncOutcome) {
    let line = match outcome {
        SyncOutcome::Synced { count } => format!("Synced {count} call(s)").green(),
        SyncOutcome::Idle => "Nothing to sync".normal(),
        SyncOutcome::Skipped(reason) => format!("Skipped: {reason:?}").yellow(),
        SyncOutcome::Failed { pending, reason } => {
            format!("Failed, {pending} call(s) still pending: {reason}").red()
        }
    };
    println!("{line}");
}
