//! # Fieldcall Registry-Core
//!
//! Server-side stores behind the fieldcall API. Each registry is an explicit
//! value owned by whoever serves requests; cloning a registry shares its
//! state, so tests simply build a fresh one.
//!
//! - [`StaffRegistry`]: operator accounts, unique by normalized phone
//! - [`ExcludedContactRegistry`]: numbers kept out of call reporting
//! - [`SystemConfigRegistry`]: key/value settings, including the sync interval
//! - [`HeartbeatStore`]: last device heartbeat per staff member
//! - [`CallLogLedger`]: idempotent sink for uploaded call batches

pub mod error;
pub mod excluded;
pub mod heartbeat;
pub mod ledger;
pub mod settings;
pub mod staff;

pub use error::{RegistryError, Result};
pub use excluded::{BatchSummary, ExcludedContact, ExcludedContactRegistry};
pub use heartbeat::{HeartbeatStore, StaffLiveness, DEFAULT_LIVE_WINDOW_SECS};
pub use ledger::{CallLogLedger, IngestSummary};
pub use settings::{SystemConfigRegistry, DEFAULT_SYNC_INTERVAL, SYNC_INTERVAL_KEY};
pub use staff::{CreateStaffRequest, Role, StaffAccount, StaffRegistry};
