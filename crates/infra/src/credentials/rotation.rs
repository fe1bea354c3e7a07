//! Token rotation task
//!
//! Refreshes the current token on a fixed period, independent of the token
//! validity window, until stopped or dropped.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::token_manager::TokenManager;

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("Token rotation already running")]
    AlreadyRunning,

    #[error("Token rotation not running")]
    NotRunning,

    #[error("Token rotation requires a Tokio runtime")]
    NoRuntime,

    #[error("Token rotation task panicked: {0}")]
    Panicked(String),

    #[error("Token rotation task did not stop within {0:?}")]
    StopTimeout(Duration),
}

/// Background task that refreshes a [`TokenManager`] periodically
pub struct TokenRotation {
    manager: Arc<TokenManager>,
    interval: Duration,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl TokenRotation {
    pub fn new(manager: Arc<TokenManager>, interval: Duration) -> Self {
        Self {
            manager,
            interval,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the rotation task on the current Tokio runtime.
    ///
    /// The first refresh happens one full interval after start.
    ///
    /// # Errors
    /// Returns `RotationError::AlreadyRunning` if started twice, or
    /// `RotationError::NoRuntime` outside a Tokio runtime.
    #[instrument(skip(self), fields(interval_ms = self.interval.as_millis() as u64))]
    pub async fn start(&mut self) -> Result<(), RotationError> {
        if self.is_running().await {
            return Err(RotationError::AlreadyRunning);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RotationError::NoRuntime)?;

        // Fresh token so a stopped rotation can be restarted
        self.cancellation_token = CancellationToken::new();

        let manager = Arc::clone(&self.manager);
        let interval = self.interval;
        let cancel = self.cancellation_token.clone();

        let handle = runtime.spawn(async move {
            Self::rotation_loop(manager, interval, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!("Token rotation started");
        Ok(())
    }

    /// Cancel the task and wait for it to finish.
    ///
    /// # Errors
    /// Returns `RotationError::NotRunning` if the task was never started, or
    /// a timeout/panic error if it did not finish cleanly.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), RotationError> {
        if !self.is_running().await {
            return Err(RotationError::NotRunning);
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Rotation task panicked: {}", e);
                    return Err(RotationError::Panicked(e.to_string()));
                }
                Err(_) => {
                    warn!("Rotation task did not complete within timeout");
                    return Err(RotationError::StopTimeout(STOP_TIMEOUT));
                }
            }
        }

        info!("Token rotation stopped");
        Ok(())
    }

    /// A rotation is running while it holds a task handle.
    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.is_some()
    }

    async fn rotation_loop(
        manager: Arc<TokenManager>,
        period: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Rotation loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = manager.refresh() {
                        error!(error = %e, "Token refresh failed; keeping previous token");
                    }
                }
            }
        }
    }
}

/// Ensure the task is cancelled when the handle is dropped
impl Drop for TokenRotation {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            debug!("TokenRotation dropped; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
