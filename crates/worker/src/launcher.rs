//! Worker launch primitive: one isolated OS process per post.
//!
//! A launched worker reports back over an mpsc channel with
//! [`WorkerEvent`]s: any JSON lines it prints on stdout, then exactly one
//! terminal `Exit` or `Error` event.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use postpix_core::types::DbId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Cannot locate worker executable: {0}")]
    Executable(#[source] std::io::Error),

    #[error("Failed to spawn worker for post {post_id}: {source}")]
    Spawn {
        post_id: DbId,
        #[source]
        source: std::io::Error,
    },
}

/// Lifecycle notification from a running worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A result line the worker printed.
    Message { post_id: DbId, payload: serde_json::Value },
    /// The worker could not be observed to completion.
    Error { post_id: DbId, error: String },
    /// The worker exited; `code` is `None` when killed by a signal.
    Exit { post_id: DbId, code: Option<i32> },
}

impl WorkerEvent {
    pub fn post_id(&self) -> DbId {
        match self {
            Self::Message { post_id, .. } | Self::Error { post_id, .. } | Self::Exit { post_id, .. } => {
                *post_id
            }
        }
    }

    /// Whether the worker is gone after this event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Message { .. })
    }
}

/// Dispatcher-side record of a launched worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    pub post_id: DbId,
    pub pid: Option<u32>,
    pub started_at: Instant,
}

/// Starts a worker bound to one post.
///
/// The returned handle means the worker is running and its events will be
/// delivered on `events`.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    async fn launch(
        &self,
        post_id: DbId,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Result<WorkerHandle, LaunchError>;
}

/// Re-executes a program with the post id as its last argument.
///
/// The child inherits the environment and stderr; stdout is piped so
/// result lines reach the dispatcher.
pub struct ProcessLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Launch workers by re-running the current executable.
    pub fn current_exe() -> Result<Self, LaunchError> {
        let program = std::env::current_exe().map_err(LaunchError::Executable)?;
        Ok(Self::new(program, Vec::new()))
    }
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn launch(
        &self,
        post_id: DbId,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Result<WorkerHandle, LaunchError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(post_id.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn { post_id, source })?;

        let pid = child.id();
        let stdout = child.stdout.take();

        tokio::spawn(async move {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => forward_line(post_id, &line, &events),
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(%post_id, error = %e, "Failed to read worker output");
                            break;
                        }
                    }
                }
            }

            let event = match child.wait().await {
                Ok(status) => WorkerEvent::Exit {
                    post_id,
                    code: status.code(),
                },
                Err(e) => WorkerEvent::Error {
                    post_id,
                    error: e.to_string(),
                },
            };
            // The receiver only goes away when the dispatcher stops.
            let _ = events.send(event);
        });

        Ok(WorkerHandle {
            post_id,
            pid,
            started_at: Instant::now(),
        })
    }
}

fn forward_line(post_id: DbId, line: &str, events: &mpsc::UnboundedSender<WorkerEvent>) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str(line) {
        Ok(payload) => {
            let _ = events.send(WorkerEvent::Message { post_id, payload });
        }
        Err(_) => tracing::debug!(%post_id, line, "Worker output"),
    }
}
