//! Recent command - Show the latest calls, optionally hiding excluded numbers

use anyhow::Result;
use fieldcall::prelude::*;
use tracing::debug;

use crate::output;

/// Execute recent command
pub async fn execute(device: &DeviceRuntime, limit: u32, excluded: &[String]) -> Result<()> {
    let normalizer = device.normalizer();
    let recent = device.queue().recent(limit).await?;
    let total = recent.len();

    let visible: Vec<CallRecord> = recent
        .into_iter()
        .filter(|call| {
            !excluded
                .iter()
                .any(|phone| normalizer.same_number(&call.phone_number, phone))
        })
        .collect();

    debug!(total, hidden = total - visible.len(), "Filtered excluded numbers");
    output::print_calls(&visible);
    Ok(())
}
