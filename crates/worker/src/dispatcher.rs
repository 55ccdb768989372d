//! Bounded post dispatcher.
//!
//! Polls the `post` table every `poll_interval` and launches one worker
//! per eligible post, never holding more than `max_workers` in flight.
//! The in-flight registry is owned by the dispatcher task and only mutated
//! there, so no lock is needed. It does not survive a restart: run at most
//! one dispatcher per database.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use postpix_core::types::DbId;
use postpix_db::store::PostStore;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::launcher::{WorkerEvent, WorkerHandle, WorkerLauncher};

/// Default cap on concurrent workers.
pub const DEFAULT_MAX_WORKERS: usize = 10;
/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Default pause between two launches in the same tick.
pub const DEFAULT_LAUNCH_PAUSE: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub max_workers: usize,
    pub poll_interval: Duration,
    pub launch_pause: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            launch_pause: DEFAULT_LAUNCH_PAUSE,
        }
    }
}

pub struct PostDispatcher {
    store: Arc<dyn PostStore>,
    launcher: Arc<dyn WorkerLauncher>,
    config: DispatcherConfig,
    in_flight: HashMap<DbId, WorkerHandle>,
    events_tx: mpsc::UnboundedSender<WorkerEvent>,
    events_rx: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl PostDispatcher {
    pub fn new(
        store: Arc<dyn PostStore>,
        launcher: Arc<dyn WorkerLauncher>,
        config: DispatcherConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            launcher,
            config,
            in_flight: HashMap::new(),
            events_tx,
            events_rx,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, post_id: DbId) -> bool {
        self.in_flight.contains_key(&post_id)
    }

    /// Run the dispatch loop until `cancel` fires.
    ///
    /// Workers still running at shutdown are left to finish on their own.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            max_workers = self.config.max_workers,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Post dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(in_flight = self.in_flight.len(), "Post dispatcher shutting down");
                    break;
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                _ = ticker.tick() => {
                    if let Err(e) = self.dispatch_once().await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }

    /// One poll: fill free slots with eligible posts not already in flight.
    ///
    /// Returns how many workers were launched. Launches are sequential; a
    /// failed launch is logged and the post stays eligible for the next tick.
    pub async fn dispatch_once(&mut self) -> Result<usize, sqlx::Error> {
        let available = self.config.max_workers.saturating_sub(self.in_flight.len());
        if available == 0 {
            tracing::debug!(in_flight = self.in_flight.len(), "No free worker slots");
            return Ok(0);
        }

        let exclude: Vec<DbId> = self.in_flight.keys().copied().collect();
        let posts = self.store.list_eligible(&exclude, available).await?;
        if posts.is_empty() {
            tracing::debug!("No posts to process");
            return Ok(0);
        }
        tracing::info!(available, eligible = posts.len(), "Dispatching posts");

        let mut launched = 0;
        for (index, post) in posts.iter().enumerate() {
            if index > 0 && !self.config.launch_pause.is_zero() {
                tokio::time::sleep(self.config.launch_pause).await;
            }

            match self.launcher.launch(post.id, self.events_tx.clone()).await {
                Ok(handle) => {
                    tracing::info!(post_id = %post.id, status = %post.status, pid = ?handle.pid, "Worker launched");
                    self.in_flight.insert(post.id, handle);
                    launched += 1;
                }
                Err(e) => {
                    tracing::error!(post_id = %post.id, error = %e, "Failed to launch worker");
                }
            }
        }

        Ok(launched)
    }

    /// Apply a worker event to the registry.
    pub fn handle_event(&mut self, event: WorkerEvent) {
        match &event {
            WorkerEvent::Message { post_id, payload } => {
                tracing::info!(%post_id, result = %payload, "Worker result");
            }
            WorkerEvent::Error { post_id, error } => {
                tracing::error!(%post_id, error = %error, "Worker error");
            }
            WorkerEvent::Exit { post_id, code: Some(0) } => {
                tracing::info!(%post_id, "Worker exited");
            }
            WorkerEvent::Exit { post_id, code } => {
                tracing::warn!(%post_id, code = ?code, "Worker exited abnormally");
            }
        }

        if event.is_terminal() {
            if let Some(handle) = self.in_flight.remove(&event.post_id()) {
                tracing::debug!(
                    post_id = %handle.post_id,
                    elapsed_ms = handle.started_at.elapsed().as_millis() as u64,
                    "Worker slot released",
                );
            }
        }
    }

    /// Apply every event already queued without waiting.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }
}
