/**
 * Presence Registry
 *
 * Owns every live [`Session`], the notebook room memberships and the typing
 * sets. It is created by the server and injected into handlers through
 * `AppState`; there is no module-level singleton.
 *
 * # Invariants
 *
 * - A session is a member of at most one room. Joining a new room first
 *   leaves the previous one.
 * - A room entry exists only while it has members, and a typing entry only
 *   while someone is typing.
 * - Typing sets hold identities, not sessions. Two tabs of one account share
 *   a typing state: `stopTyping` from either clears it, and it survives one
 *   tab leaving while the other is still in the room.
 *
 * # Concurrency
 *
 * All maps are sharded `DashMap`s. Guards are never held across two maps
 * at once; member ids are copied out before sessions are looked up. A
 * single session's events are processed sequentially by its connection
 * task, so per-session updates do not race each other.
 */

use std::collections::HashSet;
use std::net::IpAddr;

use chrono::Utc;
use dashmap::DashMap;

use crate::backend::error::BackendError;
use crate::backend::presence::session::{Outbox, Session, SessionId};
use crate::backend::presence::typing::TypingTracker;
use crate::shared::{Identity, NotebookId, PresenceUser, ServerEvent};

/// Result of a successful room join
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Members of the joined room, the joining session included
    pub current_users: Vec<PresenceUser>,
    /// Room the session was moved out of, if any
    pub previous_room: Option<NotebookId>,
}

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    sessions: DashMap<SessionId, Session>,
    rooms: DashMap<NotebookId, HashSet<SessionId>>,
    typing: TypingTracker,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session for a freshly admitted connection
    pub fn register(&self, identity: Identity, address: Option<IpAddr>, outbox: Outbox) -> SessionId {
        let session = Session::new(identity, address, outbox);
        let id = session.id;
        tracing::info!(
            "[Presence] Session {} registered ({})",
            id,
            session.identity.kind()
        );
        self.sessions.insert(id, session);
        id
    }

    /// Snapshot of a session
    pub fn session(&self, session_id: SessionId) -> Result<Session, BackendError> {
        self.sessions
            .get(&session_id)
            .map(|s| s.clone())
            .ok_or(BackendError::UnknownSession)
    }

    /// Session snapshot, provided it is currently in `notebook_id`'s room
    pub fn require_joined(&self, session_id: SessionId, notebook_id: NotebookId) -> Result<Session, BackendError> {
        let session = self.session(session_id)?;
        if !session.is_in(notebook_id) {
            return Err(BackendError::NotJoined { notebook_id });
        }
        Ok(session)
    }

    /// Move a session into `notebook_id`'s room.
    ///
    /// Access must already have been checked by the caller. Re-joining the
    /// current room is a no-op that just returns the member list.
    pub fn join_room(&self, session_id: SessionId, notebook_id: NotebookId) -> Result<JoinOutcome, BackendError> {
        let session = self.session(session_id)?;

        if session.is_in(notebook_id) {
            return Ok(JoinOutcome {
                current_users: self.room_members(notebook_id),
                previous_room: None,
            });
        }

        let previous_room = match session.current_room {
            Some(_) => self.leave_room(session_id, "switched notebook")?,
            None => None,
        };

        self.rooms.entry(notebook_id).or_default().insert(session_id);

        let user = {
            let mut entry = self
                .sessions
                .get_mut(&session_id)
                .ok_or(BackendError::UnknownSession)?;
            entry.current_room = Some(notebook_id);
            entry.joined_at = Utc::now();
            entry.presence_user()
        };

        tracing::info!("[Presence] Session {} joined notebook {}", session_id, notebook_id);

        self.broadcast_to_room(
            notebook_id,
            ServerEvent::UserJoined {
                user,
                timestamp: Utc::now(),
            },
            Some(session_id),
        );

        Ok(JoinOutcome {
            current_users: self.room_members(notebook_id),
            previous_room,
        })
    }

    /// Remove a session from its current room, if it has one.
    ///
    /// Clears its typing entry and tells the remaining members why it left.
    /// Returns the room that was left.
    pub fn leave_room(&self, session_id: SessionId, reason: &str) -> Result<Option<NotebookId>, BackendError> {
        let (room, user, typing_key) = {
            let mut entry = self
                .sessions
                .get_mut(&session_id)
                .ok_or(BackendError::UnknownSession)?;
            let Some(room) = entry.current_room.take() else {
                return Ok(None);
            };
            (room, entry.presence_user(), entry.typing_key())
        };

        let remaining: Vec<SessionId> = match self.rooms.get_mut(&room) {
            Some(mut members) => {
                members.remove(&session_id);
                members.iter().copied().collect()
            }
            None => Vec::new(),
        };
        self.rooms.remove_if(&room, |_, members| members.is_empty());

        // another tab of the same identity keeps the typing entry alive
        let shared_key = remaining.iter().any(|id| {
            self.sessions
                .get(id)
                .map(|s| s.typing_key() == typing_key)
                .unwrap_or(false)
        });
        if !shared_key {
            self.typing.stop(room, &typing_key);
        }

        tracing::info!(
            "[Presence] Session {} left notebook {} ({})",
            session_id,
            room,
            reason
        );

        self.broadcast_to_room(
            room,
            ServerEvent::UserLeft {
                user,
                timestamp: Utc::now(),
                reason: Some(reason.to_string()),
            },
            Some(session_id),
        );

        Ok(Some(room))
    }

    /// Tear down a session entirely; returns it so the caller can release
    /// its admission slot.
    pub fn disconnect(&self, session_id: SessionId, reason: &str) -> Option<Session> {
        if let Err(e) = self.leave_room(session_id, reason) {
            tracing::debug!("[Presence] Disconnect of {}: {}", session_id, e);
        }
        let removed = self.sessions.remove(&session_id).map(|(_, session)| session);
        if let Some(session) = &removed {
            tracing::info!(
                "[Presence] Session {} disconnected after {}s ({})",
                session_id,
                (Utc::now() - session.connected_at).num_seconds(),
                reason
            );
        }
        removed
    }

    /// Record that the session answered the notebook's password challenge
    pub fn unlock(&self, session_id: SessionId, notebook_id: NotebookId) -> Result<(), BackendError> {
        let mut entry = self
            .sessions
            .get_mut(&session_id)
            .ok_or(BackendError::UnknownSession)?;
        entry.unlocked.insert(notebook_id);
        Ok(())
    }

    /// Mark the session's identity as typing and tell the room.
    ///
    /// Returns false (and broadcasts nothing) if it was already typing.
    pub fn start_typing(&self, session_id: SessionId, notebook_id: NotebookId) -> Result<bool, BackendError> {
        let session = self.require_joined(session_id, notebook_id)?;
        let inserted = self.typing.start(notebook_id, &session.typing_key());
        if inserted {
            self.broadcast_to_room(
                notebook_id,
                ServerEvent::UserTyping {
                    user: session.presence_user(),
                    timestamp: Utc::now(),
                },
                Some(session_id),
            );
        }
        Ok(inserted)
    }

    pub fn stop_typing(&self, session_id: SessionId, notebook_id: NotebookId) -> Result<bool, BackendError> {
        let session = self.require_joined(session_id, notebook_id)?;
        let removed = self.typing.stop(notebook_id, &session.typing_key());
        if removed {
            self.broadcast_to_room(
                notebook_id,
                ServerEvent::UserStoppedTyping {
                    user: session.presence_user(),
                    timestamp: Utc::now(),
                },
                Some(session_id),
            );
        }
        Ok(removed)
    }

    /// Relay an opaque cursor position to the rest of the room
    pub fn share_cursor(
        &self,
        session_id: SessionId,
        notebook_id: NotebookId,
        position: serde_json::Value,
    ) -> Result<usize, BackendError> {
        let session = self.require_joined(session_id, notebook_id)?;
        Ok(self.broadcast_to_room(
            notebook_id,
            ServerEvent::UserCursorPosition {
                user: session.presence_user(),
                position,
                timestamp: Utc::now(),
            },
            Some(session_id),
        ))
    }

    /// Queue an event for one session
    pub fn send_to(&self, session_id: SessionId, event: ServerEvent) -> bool {
        match self.sessions.get(&session_id) {
            Some(session) => session.send(event),
            None => false,
        }
    }

    /// Queue an event for every room member except `except`.
    ///
    /// Returns how many sessions accepted the event.
    pub fn broadcast_to_room(
        &self,
        notebook_id: NotebookId,
        event: ServerEvent,
        except: Option<SessionId>,
    ) -> usize {
        let members: Vec<SessionId> = match self.rooms.get(&notebook_id) {
            Some(members) => members.iter().copied().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for member in members.into_iter().filter(|id| Some(*id) != except) {
            if self.send_to(member, event.clone()) {
                delivered += 1;
            }
        }

        tracing::debug!(
            "[Presence] {} delivered to {} members of {}",
            event.name(),
            delivered,
            notebook_id
        );
        delivered
    }

    /// Current members of a room, ordered by join time
    pub fn room_members(&self, notebook_id: NotebookId) -> Vec<PresenceUser> {
        let members: Vec<SessionId> = match self.rooms.get(&notebook_id) {
            Some(members) => members.iter().copied().collect(),
            None => return Vec::new(),
        };

        let mut users: Vec<PresenceUser> = members
            .into_iter()
            .filter_map(|id| self.sessions.get(&id).map(|s| s.presence_user()))
            .collect();
        users.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.session_id.cmp(&b.session_id)));
        users
    }

    pub fn room_size(&self, notebook_id: NotebookId) -> usize {
        self.rooms.get(&notebook_id).map(|m| m.len()).unwrap_or(0)
    }

    pub fn has_room(&self, notebook_id: NotebookId) -> bool {
        self.rooms.contains_key(&notebook_id)
    }

    pub fn typing_in(&self, notebook_id: NotebookId) -> Vec<String> {
        self.typing.typing_in(notebook_id)
    }

    pub fn has_typing_entry(&self, notebook_id: NotebookId) -> bool {
        self.typing.has_entry(notebook_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Source addresses that still hold at least one registered session
    pub fn live_addresses(&self) -> HashSet<IpAddr> {
        self.sessions.iter().filter_map(|s| s.address).collect()
    }
}
