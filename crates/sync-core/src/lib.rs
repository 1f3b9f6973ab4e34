//! # Fieldcall Sync-Core
//!
//! Moves captured calls from the device queue to the backend.
//!
//! - [`SyncDispatcher`]: one single-flight, all-or-nothing upload run
//! - [`SyncService`]: login/resume/foreground/logout lifecycle and interval adoption
//! - [`RecurringTask`]: the scheduler seam, with a tokio implementation
//! - [`HttpApiClient`]: reqwest client for the ingest, interval and heartbeat endpoints
//!
//! The in-process registries from `fieldcall-registry-core` implement the
//! same endpoint traits as [`HttpApiClient`], so a whole device/backend round
//! trip can run inside one process.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fieldcall_capture_core::{SessionHandle, SqliteCallQueue};
//! use fieldcall_registry_core::CallLogLedger;
//! use fieldcall_sync_core::{DispatcherOptions, SyncDispatcher, SyncTrigger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = Arc::new(SqliteCallQueue::new("sqlite::memory:").await?);
//! let sessions = SessionHandle::new();
//! let dispatcher = SyncDispatcher::new(
//!     queue,
//!     Arc::new(CallLogLedger::new()),
//!     Arc::new(sessions.clone()),
//!     DispatcherOptions::default(),
//! );
//! let outcome = dispatcher.run_once(SyncTrigger::Manual).await;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod remote;
pub mod schedule;
pub mod service;

pub use dispatcher::{DispatcherOptions, SkipReason, SyncDispatcher, SyncOutcome, SyncTrigger};
pub use error::{Result, SyncError};
pub use remote::{CallLogPayload, HeartbeatSink, HttpApiClient, IngestClient, IntervalSource};
pub use schedule::{clamp_interval, RecurringTask, SchedulePolicy, TickAction, TokioRecurringTask};
pub use service::{IntervalBounds, SyncService, CACHED_INTERVAL_KEY, MAX_INTERVAL_MINUTES, SESSION_KEY};
