/**
 * Application State Management
 *
 * `AppState` is the central state container handed to every Axum handler.
 * The `FromRef` implementations let handlers extract just the part they
 * need, following Axum's recommended pattern.
 *
 * # Thread Safety
 *
 * Every component is shared behind an `Arc` and synchronizes internally
 * (sharded maps for presence and admission, the store's own locking), so
 * cloning the state is cheap and handlers never take a global lock.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::admission::AdmissionController;
use crate::backend::auth::{AuthVerifier, IdentityResolver, JwtVerifier};
use crate::backend::collab::{CollabService, NotebookStore};
use crate::backend::presence::PresenceRegistry;
use crate::backend::server::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    /// Live sessions, rooms and typing sets
    pub presence: Arc<PresenceRegistry>,

    /// Per-address connection ceiling
    pub admission: Arc<AdmissionController>,

    /// Turns handshake credentials into an identity
    pub resolver: IdentityResolver,

    /// Join, unlock and update handling
    pub collab: CollabService,

    pub store: Arc<dyn NotebookStore>,

    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Assemble state around an existing store, verifying tokens with the
    /// configured JWT secret
    pub fn new(config: ServerConfig, store: Arc<dyn NotebookStore>) -> Self {
        let verifier: Arc<dyn AuthVerifier> = Arc::new(JwtVerifier::new(config.jwt_secret.clone()));
        Self::with_verifier(config, store, verifier)
    }

    pub fn with_verifier(
        config: ServerConfig,
        store: Arc<dyn NotebookStore>,
        verifier: Arc<dyn AuthVerifier>,
    ) -> Self {
        let presence = Arc::new(PresenceRegistry::new());
        let admission = Arc::new(AdmissionController::new(
            config.max_connections_per_address,
            config.admission_ttl(),
        ));
        Self {
            collab: CollabService::new(store.clone(), presence.clone()),
            resolver: IdentityResolver::new(verifier),
            presence,
            admission,
            store,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Arc<PresenceRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

impl FromRef<AppState> for Arc<AdmissionController> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.admission.clone()
    }
}

impl FromRef<AppState> for CollabService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.collab.clone()
    }
}
