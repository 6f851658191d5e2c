//! # Save Scheduler
//!
//! Runs on an editing client and decides when local edits are written to the
//! server. One scheduler task exists per open notebook; the
//! [`SaveScheduler`] handle talks to it over a command channel and observes
//! its [`SaveState`] through a `watch` channel.
//!
//! ## State Machine
//!
//! ```text
//! Clean --edit--> Dirty --debounce--> Saving --confirmed--> Clean
//!                   ^                    |
//!                   +----error/backoff---+--conflict--> Conflict --resolve--> Clean | Dirty
//!                                        |
//!                                        +--retries exhausted--> Failed
//! ```
//!
//! - Only the most recent snapshot is kept; intermediate edits are dropped.
//! - A save fires only if the snapshot differs from the last saved content.
//! - Edits arriving during backoff replace the snapshot but keep the retry
//!   deadline and count.
//! - `Conflict` and `Failed` stop automatic saving. A conflict is resolved
//!   with [`Resolution`]; a failure is retried by hand with
//!   [`SaveScheduler::flush`].
//!
//! Dropping the handle aborts the task.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::client::config::SaveSchedulerConfig;
use crate::client::retry::BackoffPolicy;
use crate::shared::{ConflictRecord, NotebookId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    /// Everything local has been saved
    Clean,
    /// Unsaved edits, a save is scheduled
    Dirty,
    /// A save request is in flight
    Saving,
    /// The server holds a newer version; waiting for an explicit resolution
    Conflict(ConflictRecord),
    /// Retries exhausted; automatic saving is off
    Failed(String),
}

/// Body of one save attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub notebook_id: NotebookId,
    pub content: String,
    /// Version the content was based on
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveResponse {
    Confirmed { version: i64 },
    Conflict(ConflictRecord),
}

/// Transient failures; these are retried with backoff
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("server unreachable: {0}")]
    Unavailable(String),
    #[error("save timed out")]
    Timeout,
    #[error("server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("save scheduler has stopped")]
    Stopped,
    #[error("there is no conflict to resolve")]
    NoConflict,
}

/// Sends save requests to the server
#[async_trait]
pub trait SaveTransport: Send + Sync {
    async fn submit(&self, request: SaveRequest) -> Result<SaveResponse, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Drop local edits and adopt the server copy
    AcceptServer,
    /// Rebase local edits on the server version and save immediately
    ForceOverwrite,
}

#[derive(Debug)]
enum Command {
    Edit(String),
    Remote { version: i64, content: String },
    Resolve(Resolution),
    Flush,
}

/// Handle to a running save scheduler
pub struct SaveScheduler {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SaveState>,
    task: Option<JoinHandle<()>>,
}

impl SaveScheduler {
    /// Start a scheduler for a notebook whose saved copy is `content` at `version`
    pub fn spawn(
        transport: Arc<dyn SaveTransport>,
        notebook_id: NotebookId,
        version: i64,
        content: String,
        config: SaveSchedulerConfig,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SaveState::Clean);
        let worker = Worker {
            transport,
            notebook_id,
            debounce: config.debounce,
            backoff: BackoffPolicy::from(&config),
            saved_version: version,
            saved_content: content,
            pending: None,
            retry_count: 0,
            deadline: None,
            phase: SaveState::Clean,
            state_tx,
        };
        let task = tokio::spawn(worker.run(rx));
        Self {
            commands,
            state,
            task: Some(task),
        }
    }

    fn send(&self, command: Command) -> Result<(), SaveError> {
        self.commands.send(command).map_err(|_| SaveError::Stopped)
    }

    /// Record the latest local content
    pub fn edit(&self, content: impl Into<String>) -> Result<(), SaveError> {
        self.send(Command::Edit(content.into()))
    }

    /// Tell the scheduler about a `notebookUpdated` from another writer
    pub fn apply_remote(&self, version: i64, content: impl Into<String>) -> Result<(), SaveError> {
        self.send(Command::Remote {
            version,
            content: content.into(),
        })
    }

    pub fn resolve_conflict(&self, resolution: Resolution) -> Result<(), SaveError> {
        if !matches!(*self.state.borrow(), SaveState::Conflict(_)) {
            return Err(SaveError::NoConflict);
        }
        self.send(Command::Resolve(resolution))
    }

    /// Save now, skipping the debounce; after a terminal failure this
    /// re-arms the retry budget
    pub fn flush(&self) -> Result<(), SaveError> {
        self.send(Command::Flush)
    }

    pub fn state(&self) -> watch::Receiver<SaveState> {
        self.state.clone()
    }

    pub fn current_state(&self) -> SaveState {
        self.state.borrow().clone()
    }

    /// Stop the scheduler and wait for its task to finish
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for SaveScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Worker {
    transport: Arc<dyn SaveTransport>,
    notebook_id: NotebookId,
    debounce: std::time::Duration,
    backoff: BackoffPolicy,
    saved_version: i64,
    saved_content: String,
    pending: Option<String>,
    retry_count: u32,
    deadline: Option<Instant>,
    phase: SaveState,
    state_tx: watch::Sender<SaveState>,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = wait_until(deadline) => {
                    self.deadline = None;
                    self.save().await;
                }
            }
        }
    }

    fn publish(&mut self, state: SaveState) {
        self.phase = state.clone();
        self.state_tx.send_replace(state);
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Edit(content) => self.on_edit(content),
            Command::Remote { version, content } => self.on_remote(version, content),
            Command::Resolve(resolution) => self.on_resolve(resolution),
            Command::Flush => self.on_flush(),
        }
    }

    fn on_edit(&mut self, content: String) {
        self.pending = Some(content);
        if matches!(self.phase, SaveState::Conflict(_) | SaveState::Failed(_)) {
            return;
        }
        if self.retry_count == 0 {
            self.deadline = Some(Instant::now() + self.debounce);
        }
        self.publish(SaveState::Dirty);
    }

    fn on_remote(&mut self, version: i64, content: String) {
        if version <= self.saved_version {
            return;
        }
        let idle = match self.phase {
            SaveState::Clean => true,
            SaveState::Failed(_) => self.pending.is_none(),
            _ => false,
        };
        if idle {
            tracing::debug!("[Save] Adopting remote v{} for {}", version, self.notebook_id);
            self.saved_version = version;
            self.saved_content = content;
        } else {
            tracing::debug!(
                "[Save] Remote v{} for {} arrived with local edits pending",
                version,
                self.notebook_id
            );
        }
    }

    fn on_resolve(&mut self, resolution: Resolution) {
        let SaveState::Conflict(record) = self.phase.clone() else {
            tracing::warn!("[Save] Ignoring {:?}: no conflict pending", resolution);
            return;
        };
        self.saved_version = record.server_version;
        self.saved_content = record.server_content;
        self.retry_count = 0;

        match resolution {
            Resolution::AcceptServer => {
                self.pending = None;
                self.deadline = None;
                self.publish(SaveState::Clean);
            }
            Resolution::ForceOverwrite if self.pending.is_some() => {
                self.deadline = Some(Instant::now());
                self.publish(SaveState::Dirty);
            }
            Resolution::ForceOverwrite => self.publish(SaveState::Clean),
        }
    }

    fn on_flush(&mut self) {
        match self.phase {
            SaveState::Conflict(_) => return,
            SaveState::Failed(_) => self.retry_count = 0,
            _ => {}
        }
        if self.pending.is_some() {
            self.deadline = Some(Instant::now());
            self.publish(SaveState::Dirty);
        }
    }

    async fn save(&mut self) {
        let Some(content) = self.pending.clone() else {
            return;
        };
        if content == self.saved_content {
            self.pending = None;
            self.retry_count = 0;
            self.publish(SaveState::Clean);
            return;
        }

        self.publish(SaveState::Saving);
        let request = SaveRequest {
            notebook_id: self.notebook_id,
            content: content.clone(),
            version: self.saved_version,
        };

        match self.transport.submit(request).await {
            Ok(SaveResponse::Confirmed { version }) => {
                tracing::debug!("[Save] {} saved at v{}", self.notebook_id, version);
                self.saved_version = version;
                self.saved_content = content;
                self.pending = None;
                self.retry_count = 0;
                self.publish(SaveState::Clean);
            }
            Ok(SaveResponse::Conflict(record)) => {
                tracing::info!(
                    "[Save] {} conflicts with server v{}",
                    self.notebook_id,
                    record.server_version
                );
                self.retry_count = 0;
                self.deadline = None;
                self.publish(SaveState::Conflict(record));
            }
            Err(e) => {
                self.retry_count += 1;
                match self.backoff.next_delay(self.retry_count) {
                    Some(delay) => {
                        tracing::warn!(
                            "[Save] Save of {} failed ({}), retry {} in {:?}",
                            self.notebook_id,
                            e,
                            self.retry_count,
                            delay
                        );
                        self.deadline = Some(Instant::now() + delay);
                        self.publish(SaveState::Dirty);
                    }
                    None => {
                        tracing::error!(
                            "[Save] Giving up on {} after {} retries: {}",
                            self.notebook_id,
                            self.backoff.max_retries(),
                            e
                        );
                        self.deadline = None;
                        self.publish(SaveState::Failed(e.to_string()));
                    }
                }
            }
        }
    }
}
