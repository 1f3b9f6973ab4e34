//! Sync lifecycle: login, resume, foreground, logout and interval adoption

use chrono::Utc;
use fieldcall_capture_core::{FieldcallConfig, Session, SessionHandle, SessionProvider, SqlitePreferences};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dispatcher::{SyncDispatcher, SyncOutcome, SyncTrigger};
use crate::error::{Result, SyncError};
use crate::remote::{HeartbeatSink, IntervalSource};
use crate::schedule::{clamp_interval, RecurringTask, SchedulePolicy, TickAction, TokioRecurringTask};

/// Device preference holding the last adopted interval in minutes
pub const CACHED_INTERVAL_KEY: &str = "sync_interval_minutes";

/// Device preference holding the signed-in session as JSON
pub const SESSION_KEY: &str = "session";

/// Largest interval accepted from the backend or the preference store
pub const MAX_INTERVAL_MINUTES: u64 = u32::MAX as u64;

const TASK_NAME: &str = "call-log-sync";

/// Interval limits in minutes
#[derive(Debug, Clone, Copy)]
pub struct IntervalBounds {
    pub default_minutes: u64,
    pub min_minutes: u64,
}

impl IntervalBounds {
    pub fn from_config(config: &FieldcallConfig) -> Self {
        Self {
            default_minutes: config.sync.default_interval_minutes,
            min_minutes: config.sync.min_interval_minutes,
        }
    }
}

/// Owns the recurring sync schedule for the logged-in operator
pub struct SyncService {
    dispatcher: Arc<SyncDispatcher>,
    sessions: SessionHandle,
    intervals: Arc<dyn IntervalSource>,
    preferences: SqlitePreferences,
    task: Arc<dyn RecurringTask>,
    bounds: IntervalBounds,
}

impl SyncService {
    /// Build the service with a tokio ticker that sends a heartbeat and runs the dispatcher
    pub fn new(
        dispatcher: Arc<SyncDispatcher>,
        sessions: SessionHandle,
        intervals: Arc<dyn IntervalSource>,
        heartbeat: Arc<dyn HeartbeatSink>,
        preferences: SqlitePreferences,
        bounds: IntervalBounds,
    ) -> Self {
        let action = Self::tick_action(dispatcher.clone(), sessions.clone(), heartbeat);
        let task: Arc<dyn RecurringTask> = Arc::new(TokioRecurringTask::new(TASK_NAME, action));
        Self::with_task(dispatcher, sessions, intervals, preferences, task, bounds)
    }

    /// Build the service around an existing scheduler
    pub fn with_task(
        dispatcher: Arc<SyncDispatcher>,
        sessions: SessionHandle,
        intervals: Arc<dyn IntervalSource>,
        preferences: SqlitePreferences,
        task: Arc<dyn RecurringTask>,
        bounds: IntervalBounds,
    ) -> Self {
        Self {
            dispatcher,
            sessions,
            intervals,
            preferences,
            task,
            bounds,
        }
    }

    fn tick_action(
        dispatcher: Arc<SyncDispatcher>,
        sessions: SessionHandle,
        heartbeat: Arc<dyn HeartbeatSink>,
    ) -> TickAction {
        Arc::new(move || {
            let dispatcher = dispatcher.clone();
            let sessions = sessions.clone();
            let heartbeat = heartbeat.clone();
            Box::pin(async move {
                if let Some(session) = sessions.current() {
                    if let Err(e) = heartbeat.send_heartbeat(&session).await {
                        debug!(error = %e, "Heartbeat failed");
                    }
                }
                dispatcher.run_once(SyncTrigger::Timer).await;
            })
        })
    }

    pub fn dispatcher(&self) -> &Arc<SyncDispatcher> {
        &self.dispatcher
    }

    pub fn is_syncing(&self) -> bool {
        self.dispatcher.is_syncing()
    }

    /// Start the session, arm the schedule if it is not running and sync once.
    ///
    /// The session is stored so [`SyncService::resume`] can restore it after a restart.
    pub async fn on_login(&self, session: Session) -> Result<SyncOutcome> {
        let stored = serde_json::to_string(&session)?;
        self.preferences.set(SESSION_KEY, &stored).await?;
        self.start(session).await
    }

    /// Restore the stored session after a restart and re-arm the schedule.
    ///
    /// Returns `None` when nobody is signed in. An unreadable or expired
    /// session is discarded.
    pub async fn resume(&self) -> Result<Option<SyncOutcome>> {
        let Some(stored) = self.preferences.get(SESSION_KEY).await? else {
            debug!("No stored session to resume");
            return Ok(None);
        };

        let session: Session = match serde_json::from_str(&stored) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored session");
                self.preferences.remove(SESSION_KEY).await?;
                return Ok(None);
            }
        };
        if session.is_expired(Utc::now()) {
            info!(staff_id = %session.staff_id, "Stored session expired");
            self.preferences.remove(SESSION_KEY).await?;
            return Ok(None);
        }

        info!(staff_id = %session.staff_id, "Resuming stored session");
        self.start(session).await.map(Some)
    }

    async fn start(&self, session: Session) -> Result<SyncOutcome> {
        self.sessions.login(session);

        let minutes = self.cached_interval().await?;
        self.task
            .schedule(minutes_to_duration(minutes), SchedulePolicy::KeepExisting);

        Ok(self.dispatcher.run_once(SyncTrigger::Login).await)
    }

    /// Pick up interval changes, then sync once
    pub async fn on_foreground(&self) -> SyncOutcome {
        if let Err(e) = self.adopt_remote_interval().await {
            warn!(error = %e, "Could not adopt sync interval");
        }
        self.dispatcher.run_once(SyncTrigger::Foreground).await
    }

    /// Stop the schedule and forget the session, including the stored copy
    pub async fn on_logout(&self) -> Result<()> {
        self.task.cancel();
        self.sessions.logout();
        self.preferences.remove(SESSION_KEY).await?;
        Ok(())
    }

    /// Sync now, outside the schedule
    pub async fn sync_now(&self) -> SyncOutcome {
        self.dispatcher.run_once(SyncTrigger::Manual).await
    }

    /// Fetch the backend interval and reschedule when it changed.
    ///
    /// Returns the interval in effect afterwards. Fetch and parse failures
    /// keep the cached interval; only local storage errors surface.
    pub async fn adopt_remote_interval(&self) -> Result<u64> {
        let cached = self.cached_interval().await?;

        let Some(session) = self.sessions.current() else {
            return Ok(cached);
        };

        let fetched = match self.intervals.fetch_sync_interval(&session).await {
            Ok(raw) => parse_minutes(&raw),
            Err(e) => Err(e),
        };
        let remote = match fetched {
            Ok(minutes) => self.bounded(minutes),
            Err(e) => {
                debug!(error = %e, cached, "Keeping cached sync interval");
                return Ok(cached);
            }
        };

        if remote != cached || self.task.interval().is_none() {
            self.preferences
                .set(CACHED_INTERVAL_KEY, &remote.to_string())
                .await?;
            self.task
                .schedule(minutes_to_duration(remote), SchedulePolicy::Replace);
            info!(from = cached, to = remote, "Sync interval adopted");
        }

        Ok(remote)
    }

    /// Last adopted interval, or the configured default
    pub async fn cached_interval(&self) -> Result<u64> {
        let stored = self.preferences.get(CACHED_INTERVAL_KEY).await?;
        let minutes = stored
            .and_then(|raw| parse_minutes(&raw).ok())
            .unwrap_or(self.bounds.default_minutes);
        Ok(self.bounded(minutes))
    }

    fn bounded(&self, minutes: u64) -> u64 {
        clamp_interval(minutes, self.bounds.min_minutes).min(MAX_INTERVAL_MINUTES)
    }
}

/// Parse a whole number of minutes in `1..=MAX_INTERVAL_MINUTES`
fn parse_minutes(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(minutes) if (1..=MAX_INTERVAL_MINUTES).contains(&minutes) => Ok(minutes),
        _ => Err(SyncError::InvalidInterval(raw.to_string())),
    }
}

fn minutes_to_duration(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}
