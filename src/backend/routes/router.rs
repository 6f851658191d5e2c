/**
 * Router Configuration
 *
 * Combines the WebSocket endpoint and the API routes into a single Axum
 * router, wrapped in a `TraceLayer` for request logging.
 *
 * `/ws` needs the peer address, so the router must be served with
 * `into_make_service_with_connect_info::<SocketAddr>()`.
 */

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::realtime::handle_socket_upgrade;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// - `GET /ws` - WebSocket upgrade for the real-time session
/// - `GET /health` - Liveness probe
/// - `GET /api/notebooks/{id}/presence` - Room snapshot
///
/// Unknown paths answer 404.
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/ws", get(handle_socket_upgrade));

    let router = configure_api_routes(router);

    let router = router.fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
