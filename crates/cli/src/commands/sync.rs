//! Sync command - Upload pending calls once

use anyhow::Result;
use fieldcall::prelude::*;

use crate::output;

/// Execute sync command
pub async fn execute(device: &DeviceRuntime, token: String, staff_id: String) -> Result<()> {
    device
        .sessions()
        .login(Session::new(token, StaffId::new(staff_id)));

    let outcome = device.dispatcher().run_once(SyncTrigger::Manual).await;
    output::print_outcome(&outcome);

    if let SyncOutcome::Failed { reason, .. } = outcome {
        anyhow::bail!("sync failed: {reason}");
    }
    Ok(())
}
