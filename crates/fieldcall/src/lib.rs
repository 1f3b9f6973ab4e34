//! # fieldcall - call capture and sync for field staff
//!
//! Records the phone calls field staff make and receive on their devices
//! and delivers them, exactly once in effect, to a central backend.
//!
//! ## Overview
//!
//! - **Capture Core**: telephony state machine, call-log lookup, durable SQLite queue
//! - **Registry Core**: backend stores for staff, exclusions, settings, heartbeats and calls
//! - **Sync Core**: single-flight upload dispatcher, HTTP client, recurring schedule
//!
//! ## Quick Start
//!
//! ```no_run
//! use fieldcall::prelude::*;
//!
//! # async fn run() -> Result<(), SyncError> {
//! let config = FieldcallConfig::from_env()?;
//! let device = DeviceRuntime::open(config).await?;
//! device.sessions().login(Session::new("token", StaffId::new("staff-1")));
//! let outcome = device.dispatcher().run_once(SyncTrigger::Manual).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod device;

pub use fieldcall_capture_core as capture_core;
pub use fieldcall_registry_core as registry_core;
pub use fieldcall_sync_core as sync_core;

pub use device::DeviceRuntime;

pub mod prelude {
    //! Common imports for fieldcall applications

    pub use crate::capture_core::{
        CallCapturer, CallLogEntry, CallQueue, CallRecord, CallType, CaptureOutcome,
        FieldcallConfig, PhoneNormalizer, Session, SessionHandle, SessionProvider, StaffId,
        StaticCallLog, SyncState, TelephonyEvent, TelephonyState,
    };
    pub use crate::registry_core::{
        CallLogLedger, ExcludedContactRegistry, HeartbeatStore, StaffRegistry,
        SystemConfigRegistry,
    };
    pub use crate::sync_core::{
        HttpApiClient, SyncDispatcher, SyncError, SyncOutcome, SyncService, SyncTrigger,
    };
    pub use crate::DeviceRuntime;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
