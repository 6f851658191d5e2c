/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Pick the notebook store (PostgreSQL when configured and reachable,
 *    in-memory otherwise)
 * 2. Build `AppState` around it
 * 3. Start the admission sweep task (renews live addresses, drops the rest)
 * 4. Create the router
 */

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use crate::backend::admission::AdmissionController;
use crate::backend::presence::PresenceRegistry;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_store, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("[Server] Initializing notebook collaboration backend");

    let store = load_store(&config).await;
    let app_state = AppState::new(config, store);
    build_app(app_state)
}

/// Router plus background tasks for an already assembled state
pub fn build_app(app_state: AppState) -> Router<()> {
    spawn_admission_sweep(
        app_state.admission.clone(),
        app_state.presence.clone(),
        app_state.config.admission_sweep_interval(),
    );
    tracing::info!(
        "[Server] Admission ceiling {} per address, sweep every {:?}",
        app_state.admission.max_per_address(),
        app_state.config.admission_sweep_interval()
    );

    create_router(app_state)
}

/// Periodically renew admission entries of addresses with registered
/// sessions and drop the ones whose TTL has passed
///
/// The task holds only weak references and exits once either the controller
/// or the registry is dropped.
pub fn spawn_admission_sweep(
    admission: Arc<AdmissionController>,
    presence: Arc<PresenceRegistry>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    let admission = Arc::downgrade(&admission);
    let presence = Arc::downgrade(&presence);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let (Some(admission), Some(presence)) = (admission.upgrade(), presence.upgrade()) else {
                break;
            };
            for address in presence.live_addresses() {
                admission.renew(address);
            }
            admission.sweep_expired();
        }
    })
}
