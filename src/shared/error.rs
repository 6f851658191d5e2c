//! Frame Errors
//!
//! Failures decoding or checking a socket frame. Both sides of the socket
//! use the same type; the server wraps it in `BackendError` and reports it to
//! the offending session as an `error` event.
//!
//! - `MalformedFrame` - the text is not a known `{"event", "data"}` envelope
//! - `InvalidField` - the envelope parsed but a payload field is unusable
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Malformed frame: {message}")]
    MalformedFrame { message: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl SharedError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
