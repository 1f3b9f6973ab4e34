//! Pending command - List calls waiting for upload

use anyhow::Result;
use fieldcall::prelude::*;

use crate::output;

/// Execute pending command
pub async fn execute(device: &DeviceRuntime) -> Result<()> {
    let pending = device.queue().list_pending().await?;
    output::print_calls(&pending);
    println!("{} pending", pending.len());
    Ok(())
}
