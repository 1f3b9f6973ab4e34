//! Logout command - Forget the stored session

use anyhow::Result;
use colored::Colorize;
use fieldcall::prelude::*;

/// Execute logout command
pub async fn execute(device: &DeviceRuntime) -> Result<()> {
    device.sync_service().on_logout().await?;
    println!("{}", "Logged out".green());
    Ok(())
}
