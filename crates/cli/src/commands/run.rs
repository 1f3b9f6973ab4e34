//! Run command - Sync on the recurring schedule until interrupted

use anyhow::{bail, Result};
use colored::Colorize;
use fieldcall::prelude::*;
use tracing::info;

use crate::output;

/// Execute run command.
///
/// Without credentials the session stored by an earlier run is resumed.
pub async fn execute(
    device: &DeviceRuntime,
    token: Option<String>,
    staff_id: Option<String>,
) -> Result<()> {
    let service = device.sync_service();

    let outcome = match (token, staff_id) {
        (Some(token), Some(staff_id)) => {
            service
                .on_login(Session::new(token, StaffId::new(staff_id)))
                .await?
        }
        (None, None) => match service.resume().await? {
            Some(outcome) => outcome,
            None => bail!("No stored session, pass --token and --staff-id to log in"),
        },
        _ => bail!("--token and --staff-id must be given together"),
    };
    output::print_outcome(&outcome);

    let outcome = service.on_foreground().await;
    output::print_outcome(&outcome);

    let minutes = service.cached_interval().await?;
    println!(
        "{} syncing every {minutes} minute(s), press Ctrl+C to stop",
        "Live".green().bold()
    );

    tokio::signal::ctrl_c().await?;
    info!("Stopping scheduled sync, session kept for the next run");
    Ok(())
}
