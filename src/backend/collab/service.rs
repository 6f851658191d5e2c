/**
 * Notebook Collaboration Service
 *
 * Glues the presence registry to the notebook store:
 * - `join_notebook` checks read access against fresh metadata, then moves
 *   the session into the notebook's room
 * - `unlock_notebook` answers a notebook's password challenge
 * - `submit_update` is the conflict detector and update broadcaster
 *
 * # Update Protocol
 *
 * 1. The session must be in the notebook's room (`NotJoined` otherwise)
 * 2. Write access is re-evaluated against freshly loaded metadata
 * 3. A client version older than the stored one is answered with a
 *    `conflictDetected` payload; nothing is written
 * 4. Otherwise the store's atomic compare-and-set applies the write and
 *    increments the version by one. If a concurrent writer got there first
 *    the CAS fails and this writer gets the conflict payload instead
 * 5. Accepted writes are fanned out to the rest of the room and confirmed
 *    to the writer
 */

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::collab::access::can_access;
use crate::backend::collab::store::{CasOutcome, NotebookStore, StoreError};
use crate::backend::error::BackendError;
use crate::backend::presence::{JoinOutcome, PresenceRegistry, SessionId};
use crate::shared::{AccessIntent, ConflictRecord, NotebookId, NotebookRecord, ServerEvent, SharedError};

/// A save request as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub notebook_id: NotebookId,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Version the client last observed
    pub client_version: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Write persisted at `version`
    Applied { version: i64, timestamp: DateTime<Utc> },
    /// Write refused; the writer must resynchronize from the record
    Conflict(ConflictRecord),
}

#[derive(Clone)]
pub struct CollabService {
    store: Arc<dyn NotebookStore>,
    presence: Arc<PresenceRegistry>,
}

fn map_store_error(err: StoreError) -> BackendError {
    match err {
        StoreError::NotFound(notebook_id) => BackendError::NotFound { notebook_id },
        other => BackendError::PersistenceError(other),
    }
}

impl CollabService {
    pub fn new(store: Arc<dyn NotebookStore>, presence: Arc<PresenceRegistry>) -> Self {
        Self { store, presence }
    }

    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    async fn load(&self, notebook_id: NotebookId) -> Result<NotebookRecord, BackendError> {
        self.store
            .get_notebook(notebook_id)
            .await
            .map_err(map_store_error)?
            .ok_or(BackendError::NotFound { notebook_id })
    }

    /// Join a notebook's room and send the member list to the joiner
    pub async fn join_notebook(
        &self,
        session_id: SessionId,
        notebook_id: NotebookId,
    ) -> Result<JoinOutcome, BackendError> {
        let session = self.presence.session(session_id)?;
        let notebook = self.load(notebook_id).await?;
        let unlocked = session.unlocked.contains(&notebook_id);

        if !can_access(&session.identity, &notebook, AccessIntent::Read, unlocked) {
            tracing::warn!(
                "[Collab] Session {} ({}) denied access to {}",
                session_id,
                session.identity.kind(),
                notebook_id
            );
            return Err(BackendError::AccessDenied { notebook_id });
        }

        let outcome = self.presence.join_room(session_id, notebook_id)?;
        self.presence.send_to(
            session_id,
            ServerEvent::JoinedNotebook {
                notebook_id,
                current_users: outcome.current_users.clone(),
            },
        );
        Ok(outcome)
    }

    /// Leave a notebook's room without disconnecting
    pub fn leave_notebook(&self, session_id: SessionId, notebook_id: NotebookId) -> Result<(), BackendError> {
        self.presence.require_joined(session_id, notebook_id)?;
        self.presence.leave_room(session_id, "left")?;
        self.presence
            .send_to(session_id, ServerEvent::LeftNotebook { notebook_id });
        Ok(())
    }

    /// Answer a notebook's password challenge for this session
    pub async fn unlock_notebook(
        &self,
        session_id: SessionId,
        notebook_id: NotebookId,
        password: String,
    ) -> Result<(), BackendError> {
        self.presence.session(session_id)?;
        let notebook = self.load(notebook_id).await?;

        if let Some(hash) = notebook.password_hash {
            let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
                .await
                .map(|result| {
                    result.unwrap_or_else(|e| {
                        tracing::error!("[Collab] Stored password hash for {} is unusable: {}", notebook_id, e);
                        false
                    })
                })
                .unwrap_or(false);

            if !verified {
                tracing::warn!("[Collab] Wrong password for {} from session {}", notebook_id, session_id);
                return Err(BackendError::AccessDenied { notebook_id });
            }
        }

        self.presence.unlock(session_id, notebook_id)?;
        self.presence
            .send_to(session_id, ServerEvent::NotebookUnlocked { notebook_id });
        Ok(())
    }

    /// Apply a save request under optimistic concurrency
    pub async fn submit_update(
        &self,
        session_id: SessionId,
        request: UpdateRequest,
    ) -> Result<UpdateOutcome, BackendError> {
        let notebook_id = request.notebook_id;
        let session = self.presence.require_joined(session_id, notebook_id)?;

        if request.title.is_none() && request.content.is_none() {
            return Err(SharedError::invalid_field("content", "update carries neither title nor content").into());
        }

        let notebook = self.load(notebook_id).await?;
        let unlocked = session.unlocked.contains(&notebook_id);
        if !can_access(&session.identity, &notebook, AccessIntent::Write, unlocked) {
            tracing::warn!("[Collab] Session {} may not edit {}", session_id, notebook_id);
            return Err(BackendError::AccessDenied { notebook_id });
        }

        if let Some(client_version) = request.client_version {
            if notebook.version > client_version {
                tracing::info!(
                    "[Collab] Stale write to {}: client v{} < server v{}",
                    notebook_id,
                    client_version,
                    notebook.version
                );
                return Ok(self.reject_stale(session_id, &notebook));
            }
        }

        let expected_version = request.client_version.unwrap_or(notebook.version);
        let outcome = self
            .store
            .compare_and_set_version(notebook_id, expected_version, request.title, request.content)
            .await
            .map_err(map_store_error)?;

        match outcome {
            CasOutcome::Applied(updated) => {
                let timestamp = updated.updated_at;
                let version = updated.version;
                tracing::info!("[Collab] {} saved at v{} by {}", notebook_id, version, session_id);

                self.presence.broadcast_to_room(
                    notebook_id,
                    ServerEvent::NotebookUpdated {
                        notebook_id,
                        title: updated.title,
                        content: updated.content,
                        version,
                        updated_by: session.presence_user(),
                        timestamp,
                    },
                    Some(session_id),
                );
                self.presence
                    .send_to(session_id, ServerEvent::UpdateConfirmed { version, timestamp });

                Ok(UpdateOutcome::Applied { version, timestamp })
            }
            CasOutcome::VersionConflict(current) => {
                tracing::info!(
                    "[Collab] Concurrent write to {} won the race (now v{})",
                    notebook_id,
                    current.version
                );
                Ok(self.reject_stale(session_id, &current))
            }
        }
    }

    fn reject_stale(&self, session_id: SessionId, current: &NotebookRecord) -> UpdateOutcome {
        let record = current.conflict_record();
        self.presence
            .send_to(session_id, ServerEvent::ConflictDetected(record.clone()));
        UpdateOutcome::Conflict(record)
    }
}
