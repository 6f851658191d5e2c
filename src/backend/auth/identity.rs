//! Identity resolution for socket handshakes.
//!
//! A token always wins: if one is presented it must verify, otherwise the
//! handshake fails. Without a token, a complete guest descriptor yields a
//! guest; anything else connects as anonymous.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;

use crate::backend::auth::sessions::AuthVerifier;
use crate::backend::error::BackendError;
use crate::shared::Identity;

/// Credentials offered during the handshake
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeCredentials {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub guest_id: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
}

impl HandshakeCredentials {
    /// Prefer a `Bearer` token from the `Authorization` header over the
    /// query-string token.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());
        if let Some(token) = bearer {
            self.token = Some(token);
        }
        self
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn guest(&self) -> Option<(&str, &str)> {
        let id = self.guest_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let name = self.guest_name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((id, name))
    }
}

/// Derives a connection's [`Identity`] from handshake credentials
#[derive(Clone)]
pub struct IdentityResolver {
    verifier: Arc<dyn AuthVerifier>,
}

impl IdentityResolver {
    pub fn new(verifier: Arc<dyn AuthVerifier>) -> Self {
        Self { verifier }
    }

    pub async fn resolve(&self, credentials: &HandshakeCredentials) -> Result<Identity, BackendError> {
        if let Some(token) = credentials.token() {
            let identity = self.verifier.verify(token).await?;
            tracing::debug!("[Auth] Resolved authenticated identity {:?}", identity.id());
            return Ok(identity);
        }

        if let Some((id, name)) = credentials.guest() {
            tracing::debug!("[Auth] Resolved guest identity {}", id);
            return Ok(Identity::Guest {
                id: id.to_string(),
                name: name.to_string(),
            });
        }

        Ok(Identity::Anonymous)
    }
}
