/**
 * Backend Error Types
 *
 * This module defines the error taxonomy of the real-time core. Every error
 * is connection-local: it is reported to the session that caused it and
 * never touches another session's state.
 *
 * # Error Categories
 *
 * ## Handshake Errors
 *
 * - `AuthError` - bad or expired token, handshake rejected
 * - `ConnectionLimitExceeded` - too many live connections from one address
 *
 * ## Session Errors
 *
 * - `AccessDenied` - join, unlock or update refused; session state unchanged
 * - `NotFound` - target notebook missing
 * - `NotJoined` - event sent for a notebook the session is not in
 *
 * ## Infrastructure Errors
 *
 * - `PersistenceError` - transient store failure, the client may retry
 * - `ProtocolError` - frame type the socket does not speak (binary)
 * - `SharedError` - frame that fails to decode or carries an unusable payload
 *
 * Stale writes are not errors: they are the `Conflict` outcome of an update.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::collab::store::StoreError;
use crate::shared::{NotebookId, SharedError};

#[derive(Debug, Error)]
pub enum BackendError {
    /// Token could not be verified
    #[error("Authentication failed: {message}")]
    AuthError {
        /// Human-readable error message
        message: String,
    },

    /// Per-address connection ceiling reached
    #[error("Too many connections from {address} (limit {limit})")]
    ConnectionLimitExceeded {
        /// Source address that hit the ceiling
        address: String,
        /// Configured ceiling
        limit: usize,
    },

    /// Identity lacks the capability for the requested notebook
    #[error("Access denied to notebook {notebook_id}")]
    AccessDenied { notebook_id: NotebookId },

    #[error("Notebook {notebook_id} not found")]
    NotFound { notebook_id: NotebookId },

    /// Session is not a member of the notebook's room
    #[error("Not joined to notebook {notebook_id}")]
    NotJoined { notebook_id: NotebookId },

    /// Session id no longer registered (connection already torn down)
    #[error("Unknown session")]
    UnknownSession,

    #[error("Persistence error: {0}")]
    PersistenceError(#[from] StoreError),

    /// Malformed or unexpected socket frame
    #[error("Protocol error: {message}")]
    ProtocolError {
        /// Human-readable error message
        message: String,
    },

    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthError {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// Only the handshake errors ever reach HTTP; the rest are mapped for the
    /// diagnostic routes.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthError { .. } => StatusCode::UNAUTHORIZED,
            Self::ConnectionLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::AccessDenied { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::NotJoined { .. } => StatusCode::CONFLICT,
            Self::UnknownSession => StatusCode::GONE,
            Self::PersistenceError(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message reported to the client in an `error` event or JSON body
    pub fn message(&self) -> String {
        self.to_string()
    }
}
