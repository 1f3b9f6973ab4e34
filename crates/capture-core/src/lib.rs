//! # Fieldcall Capture-Core
//!
//! Device-side half of the fieldcall pipeline: observe telephony state,
//! resolve the finished call in the device call log, and hold the resulting
//! record in a durable local queue until the sync dispatcher uploads it.
//!
//! This crate provides:
//! - The call data model ([`CallRecord`], [`CallType`], [`SyncState`])
//! - An OS-independent telephony state machine and the [`CallCapturer`]
//! - The [`CallQueue`] trait with a SQLite implementation
//! - The observable [`SessionHandle`]
//! - Shared phone normalization, configuration and logging setup
//!
//! ## Architecture
//!
//! ```text
//! TelephonyEvent ─▶ CallStateMachine ─▶ CallCapturer ─▶ CallQueue (SQLite)
//!                                          │    ▲
//!                          CallLogProvider ┘    └ SessionProvider
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod logging;
pub mod phone;
pub mod queue;
pub mod session;
pub mod types;

pub use capture::{
    CallCapturer, CallLogProvider, CallStateMachine, CaptureOutcome, StaticCallLog,
    TelephonyEvent, TelephonyState, Transition,
};
pub use config::{
    ApiConfig, CaptureConfig, DatabaseConfig, FieldcallConfig, SyncConfig, MAX_LOOKUP_WINDOW_SECS,
};
pub use error::{CaptureError, Result};
pub use logging::{setup_logging, LoggingConfig};
pub use phone::{normalize_phone, PhoneNormalizer};
pub use queue::{CallQueue, SqliteCallQueue, SqlitePreferences};
pub use session::{Session, SessionHandle, SessionProvider};
pub use types::{CallLogEntry, CallRecord, CallType, StaffId, SyncState};
