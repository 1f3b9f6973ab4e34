//! System configuration key/value registry

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{RegistryError, Result};
use crate::staff::StaffAccount;

/// Key holding the device sync interval in minutes
pub const SYNC_INTERVAL_KEY: &str = "sync_interval_minutes";

/// Value served when the interval was never set
pub const DEFAULT_SYNC_INTERVAL: &str = "15";

/// System-wide settings
#[derive(Clone, Default)]
pub struct SystemConfigRegistry {
    values: Arc<DashMap<String, String>>,
}

impl SystemConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.values
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    /// Current sync interval in minutes, as stored
    pub fn sync_interval(&self) -> String {
        self.get(SYNC_INTERVAL_KEY)
            .unwrap_or_else(|| DEFAULT_SYNC_INTERVAL.to_string())
    }

    /// Change the sync interval; admin only
    pub fn update_sync_interval(&self, actor: &StaffAccount, value: &str) -> Result<String> {
        if !actor.is_admin() {
            return Err(RegistryError::Forbidden(format!(
                "{} may not change the sync interval",
                actor.id
            )));
        }

        let value = value.trim();
        match value.parse::<u32>() {
            Ok(minutes) if minutes > 0 => {}
            _ => {
                return Err(RegistryError::Validation(format!(
                    "Value must be a positive number of minutes, got {value:?}"
                )))
            }
        }

        self.set(SYNC_INTERVAL_KEY, value);
        info!(actor = %actor.id, minutes = value, "Sync interval updated");
        Ok(value.to_string())
    }
}
