//! Replay command - Run recorded telephony events through the capturer

use anyhow::{Context, Result};
use fieldcall::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::output;

/// Execute replay command
pub async fn execute(
    device: &DeviceRuntime,
    events_path: &Path,
    call_log_path: &Path,
    staff_id: String,
    token: Option<String>,
) -> Result<()> {
    let snapshot = tokio::fs::read_to_string(call_log_path)
        .await
        .with_context(|| format!("Failed to read call log {}", call_log_path.display()))?;
    let call_log = Arc::new(StaticCallLog::from_json(&snapshot)?);

    let events = tokio::fs::read_to_string(events_path)
        .await
        .with_context(|| format!("Failed to read events {}", events_path.display()))?;

    let upload = token.is_some();
    let token = token.unwrap_or_else(|| "replay".to_string());
    device
        .sessions()
        .login(Session::new(token, StaffId::new(staff_id)));
    let mut capturer = device.capturer(call_log);

    let mut queued = 0;
    let mut misses = 0;
    let mut uploaded = 0;
    for (line_no, line) in events.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: TelephonyEvent = serde_json::from_str(line)
            .with_context(|| format!("Bad event on line {}", line_no + 1))?;

        let outcome = if upload {
            let (outcome, sync) = device.capture_and_sync(&mut capturer, &event).await?;
            match sync {
                Some(SyncOutcome::Synced { count }) => uploaded += count,
                Some(other) if !other.is_success() => output::print_outcome(&other),
                _ => {}
            }
            outcome
        } else {
            capturer.handle(&event).await?
        };

        match outcome {
            CaptureOutcome::Queued(record) => {
                queued += 1;
                println!(
                    "queued  {} {} {}s",
                    record.provider_call_id, record.call_type, record.duration_seconds
                );
            }
            CaptureOutcome::Duplicate(id) => println!("dup     {id}"),
            CaptureOutcome::LookupMiss => {
                misses += 1;
                warn!(line = line_no + 1, "No call-log entry for completed call");
            }
            CaptureOutcome::NoSession => warn!("Capture dropped, no session"),
            CaptureOutcome::InProgress | CaptureOutcome::Ignored => {}
        }
    }

    info!(queued, misses, uploaded, "Replay finished");
    println!("{queued} call(s) queued, {misses} lookup miss(es)");
    if upload {
        println!("{uploaded} call(s) uploaded");
    }
    Ok(())
}
