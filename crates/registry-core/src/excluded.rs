//! Numbers excluded from call reporting (family, colleagues, vendors)

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fieldcall_capture_core::PhoneNormalizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{RegistryError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedContact {
    pub id: String,
    /// Number as entered
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a batch import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Exclusion list keyed by normalized phone
#[derive(Clone)]
pub struct ExcludedContactRegistry {
    contacts: Arc<DashMap<String, ExcludedContact>>,
    normalizer: PhoneNormalizer,
}

impl Default for ExcludedContactRegistry {
    fn default() -> Self {
        Self::new(PhoneNormalizer::default())
    }
}

impl ExcludedContactRegistry {
    pub fn new(normalizer: PhoneNormalizer) -> Self {
        Self {
            contacts: Arc::new(DashMap::new()),
            normalizer,
        }
    }

    /// Add a number; an already excluded number returns the existing entry
    pub fn add(&self, phone_number: &str, contact_name: Option<String>) -> Result<ExcludedContact> {
        let key = self.normalizer.normalize(phone_number);
        if key.is_empty() {
            return Err(RegistryError::Validation("Phone number is required".to_string()));
        }

        let contact = self
            .contacts
            .entry(key)
            .or_insert_with(|| ExcludedContact {
                id: Uuid::new_v4().to_string(),
                phone_number: phone_number.to_string(),
                contact_name,
                created_at: Utc::now(),
            })
            .clone();

        debug!(phone = %contact.phone_number, "Excluded contact present");
        Ok(contact)
    }

    pub fn add_batch<S: AsRef<str>>(&self, phones: &[S]) -> BatchSummary {
        let mut added = 0;
        let mut skipped = 0;

        for phone in phones {
            let key = self.normalizer.normalize(phone.as_ref());
            if key.is_empty() || self.contacts.contains_key(&key) {
                skipped += 1;
                continue;
            }
            match self.add(phone.as_ref(), None) {
                Ok(_) => added += 1,
                Err(_) => skipped += 1,
            }
        }

        let summary = BatchSummary {
            added,
            skipped,
            total: self.contacts.len(),
        };
        info!(added, skipped, total = summary.total, "Excluded contacts imported");
        summary
    }

    /// Remove every entry matching the number
    pub fn remove(&self, phone_number: &str) -> Result<ExcludedContact> {
        let key = self.normalizer.normalize(phone_number);
        self.contacts
            .remove(&key)
            .map(|(_, contact)| contact)
            .ok_or_else(|| RegistryError::NotFound(phone_number.to_string()))
    }

    pub fn is_excluded(&self, phone_number: &str) -> bool {
        self.contacts.contains_key(&self.normalizer.normalize(phone_number))
    }

    /// All entries, oldest first
    pub fn list(&self) -> Vec<ExcludedContact> {
        let mut contacts: Vec<ExcludedContact> =
            self.contacts.iter().map(|entry| entry.value().clone()).collect();
        contacts.sort_by_key(|c| c.created_at);
        contacts
    }

    /// Numbers as entered, for quick client-side lookups
    pub fn phones(&self) -> Vec<String> {
        self.list().into_iter().map(|c| c.phone_number).collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_is_idempotent_across_formats() {
        let registry = ExcludedContactRegistry::default();
        let first = registry.add("+91 99887 76655", Some("Home".to_string())).unwrap();
        let again = registry.add("919988776655", None).unwrap();

        assert_eq!(first, again);
        assert_eq!(registry.len(), 1);
        assert!(registry.is_excluded("9988776655"));
    }

    #[test]
    fn test_batch_counts() {
        let registry = ExcludedContactRegistry::default();
        registry.add("9988776655", None).unwrap();

        let summary = registry.add_batch(&["+919988776655", "9000012345", "9000012345", ""]);
        assert_eq!(
            summary,
            BatchSummary {
                added: 1,
                skipped: 3,
                total: 2
            }
        );
    }

    #[test]
    fn test_remove() {
        let registry = ExcludedContactRegistry::default();
        registry.add("9988776655", None).unwrap();

        let removed = registry.remove("+91-99887-76655").unwrap();
        assert_eq!(removed.phone_number, "9988776655");
        assert!(!registry.is_excluded("9988776655"));
        assert_eq!(
            registry.remove("9988776655"),
            Err(RegistryError::NotFound("9988776655".to_string()))
        );
    }

    #[test]
    fn test_phones_lists_entered_numbers() {
        let registry = ExcludedContactRegistry::default();
        registry.add("+91 90000 00001", None).unwrap();
        assert_eq!(registry.phones(), vec!["+91 90000 00001".to_string()]);
    }
}
