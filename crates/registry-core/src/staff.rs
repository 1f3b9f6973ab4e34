//! Staff accounts

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fieldcall_capture_core::{PhoneNormalizer, StaffId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{RegistryError, Result};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Staff,
}

/// Operator account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAccount {
    pub id: StaffId,
    pub name: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl StaffAccount {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Request to create an account
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStaffRequest {
    pub name: String,
    pub phone: String,
    pub role: Role,
}

/// In-memory staff registry, unique by normalized phone
#[derive(Clone)]
pub struct StaffRegistry {
    accounts: Arc<DashMap<StaffId, StaffAccount>>,
    /// normalized phone -> account id
    by_phone: Arc<DashMap<String, StaffId>>,
    normalizer: PhoneNormalizer,
}

impl Default for StaffRegistry {
    fn default() -> Self {
        Self::new(PhoneNormalizer::default())
    }
}

impl StaffRegistry {
    pub fn new(normalizer: PhoneNormalizer) -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
            by_phone: Arc::new(DashMap::new()),
            normalizer,
        }
    }

    pub fn create(&self, request: CreateStaffRequest) -> Result<StaffAccount> {
        if request.name.trim().is_empty() {
            return Err(RegistryError::Validation("Name is required".to_string()));
        }
        let key = self.normalizer.normalize(&request.phone);
        if key.is_empty() {
            return Err(RegistryError::Validation("Phone is required".to_string()));
        }

        let account = match self.by_phone.entry(key) {
            Entry::Occupied(_) => return Err(RegistryError::AlreadyExists(request.phone)),
            Entry::Vacant(slot) => {
                let account = StaffAccount {
                    id: StaffId(Uuid::new_v4().to_string()),
                    name: request.name,
                    phone: request.phone,
                    role: request.role,
                    created_at: Utc::now(),
                };
                slot.insert(account.id.clone());
                account
            }
        };

        self.accounts.insert(account.id.clone(), account.clone());
        info!(staff_id = %account.id, role = ?account.role, "Staff account created");
        Ok(account)
    }

    pub fn get(&self, id: &StaffId) -> Option<StaffAccount> {
        self.accounts.get(id).map(|entry| entry.clone())
    }

    pub fn find_by_phone(&self, phone: &str) -> Option<StaffAccount> {
        let key = self.normalizer.normalize(phone);
        let id = self.by_phone.get(&key)?.clone();
        self.get(&id)
    }

    /// Accounts with `role`, oldest first
    pub fn list_by_role(&self, role: Role) -> Vec<StaffAccount> {
        let mut accounts: Vec<StaffAccount> = self
            .accounts
            .iter()
            .filter(|entry| entry.role == role)
            .map(|entry| entry.clone())
            .collect();
        accounts.sort_by_key(|a| a.created_at);
        accounts
    }

    pub fn delete(&self, id: &StaffId) -> Result<()> {
        let (_, account) = self
            .accounts
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        self.by_phone.remove(&self.normalizer.normalize(&account.phone));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }
}
