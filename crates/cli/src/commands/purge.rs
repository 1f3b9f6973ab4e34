//! Purge command - Drop synced calls past retention

use anyhow::Result;
use chrono::{Duration, Utc};
use fieldcall::prelude::*;
use tracing::info;

const MAX_DAYS: u64 = 36_500;

/// Execute purge command
pub async fn execute(device: &DeviceRuntime, days: Option<u64>) -> Result<()> {
    let days = days.unwrap_or(device.config().sync.retention_days).min(MAX_DAYS) as i64;
    let cutoff = Utc::now() - Duration::days(days);

    let purged = device.queue().purge_synced_older_than(cutoff).await?;
    info!(days, purged, "Purge complete");
    println!("Removed {purged} synced call(s) older than {days} day(s)");
    Ok(())
}
