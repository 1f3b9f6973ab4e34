//! Device-side wiring from one configuration

use fieldcall_capture_core::{
    CallCapturer, CallLogProvider, CaptureOutcome, FieldcallConfig, PhoneNormalizer,
    SessionHandle, SqliteCallQueue, TelephonyEvent,
};
use fieldcall_sync_core::{
    DispatcherOptions, HttpApiClient, IntervalBounds, Result, SyncDispatcher, SyncOutcome,
    SyncService, SyncTrigger,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Queue, session, backend client and dispatcher of one device
pub struct DeviceRuntime {
    config: FieldcallConfig,
    queue: Arc<SqliteCallQueue>,
    sessions: SessionHandle,
    client: Arc<HttpApiClient>,
    dispatcher: Arc<SyncDispatcher>,
}

impl DeviceRuntime {
    /// Open the local queue and build the backend client
    pub async fn open(config: FieldcallConfig) -> Result<Self> {
        let queue = Arc::new(SqliteCallQueue::new(&config.database.url).await?);
        let client = Arc::new(HttpApiClient::new(&config.api)?);
        let sessions = SessionHandle::new();

        let dispatcher = Arc::new(SyncDispatcher::new(
            queue.clone(),
            client.clone(),
            Arc::new(sessions.clone()),
            DispatcherOptions::from_config(&config),
        ));

        info!(api = %client.base_url(), "Device runtime ready");
        Ok(Self {
            config,
            queue,
            sessions,
            client,
            dispatcher,
        })
    }

    /// Loaded configuration
    pub fn config(&self) -> &FieldcallConfig {
        &self.config
    }

    /// Local call queue
    pub fn queue(&self) -> &Arc<SqliteCallQueue> {
        &self.queue
    }

    /// Session shared by capture and sync
    pub fn sessions(&self) -> &SessionHandle {
        &self.sessions
    }

    /// Upload dispatcher
    pub fn dispatcher(&self) -> &Arc<SyncDispatcher> {
        &self.dispatcher
    }

    /// Phone normalizer for the configured country code
    pub fn normalizer(&self) -> PhoneNormalizer {
        PhoneNormalizer::new(self.config.capture.country_code.clone())
    }

    /// Capturer reading the given call log
    pub fn capturer(&self, call_log: Arc<dyn CallLogProvider>) -> CallCapturer {
        CallCapturer::new(
            self.queue.clone(),
            call_log,
            Arc::new(self.sessions.clone()),
            &self.config.capture,
        )
    }

    /// Feed one event to `capturer` and try an immediate upload when it queued a call.
    ///
    /// The upload goes through the dispatcher's single-flight guard; if it is
    /// skipped or fails the record stays PENDING for the next trigger.
    pub async fn capture_and_sync(
        &self,
        capturer: &mut CallCapturer,
        event: &TelephonyEvent,
    ) -> Result<(CaptureOutcome, Option<SyncOutcome>)> {
        let outcome = capturer.handle(event).await?;
        if !matches!(outcome, CaptureOutcome::Queued(_)) {
            return Ok((outcome, None));
        }

        let upload = self.dispatcher.run_once(SyncTrigger::Capture).await;
        debug!(?upload, "Post-capture upload attempted");
        Ok((outcome, Some(upload)))
    }

    /// Sync lifecycle on a tokio ticker, talking to the HTTP backend
    pub fn sync_service(&self) -> SyncService {
        SyncService::new(
            self.dispatcher.clone(),
            self.sessions.clone(),
            self.client.clone(),
            self.client.clone(),
            self.queue.preferences(),
            IntervalBounds::from_config(&self.config),
        )
    }
}
