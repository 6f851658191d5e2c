/**
 * JWT Token Verification
 *
 * Bearer tokens presented at the socket handshake are HS256 JWTs issued by
 * the account service. This module decodes them into an authenticated
 * [`Identity`]; `create_token` issues compatible tokens for tooling and tests.
 */

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::error::BackendError;
use crate::shared::{Identity, Role};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// Display name; falls back to the email when absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        let name = claims.name.unwrap_or_else(|| claims.email.clone());
        Identity::Authenticated {
            id: claims.sub,
            name,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// External collaborator that turns a bearer token into an identity
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, BackendError>;
}

/// HS256 verifier backed by a shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, BackendError> {
        let claims = verify_token(&self.secret, token).map_err(|e| {
            tracing::warn!("[Auth] Invalid token: {:?}", e);
            BackendError::auth(e.to_string())
        })?;
        Ok(claims.into())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Create a JWT token for a user
///
/// # Arguments
/// * `secret` - HS256 signing secret
/// * `user_id` - Account id placed in `sub`
/// * `email` - Account email
/// * `name` - Optional display name
/// * `ttl_secs` - Lifetime of the token
pub fn create_token(
    secret: &str,
    user_id: &str,
    email: &str,
    name: Option<&str>,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = now_secs();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        name: name.map(str::to_string),
        role: Role::User,
        exp: now + ttl_secs,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Verify and decode a JWT token
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let token_data = decode::<Claims>(token, &key, &Validation::default())?;
    Ok(token_data.claims)
}
