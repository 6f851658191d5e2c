/**
 * WebSocket Transport
 *
 * `GET /ws` upgrades to a WebSocket carrying JSON frames of the form
 * `{"event": "<name>", "data": {...}}`.
 *
 * # Connection Lifecycle
 *
 * 1. **Admission**: the source address takes a slot (429 when full)
 * 2. **Identity**: token, guest descriptor or anonymous (401 on a bad
 *    token; the admission slot is handed back)
 * 3. **Upgrade**: the session is registered with an outbound queue and a
 *    writer task that drains it onto the socket
 * 4. **Event loop**: each frame is parsed and dispatched; failures become
 *    an `error` event for this connection only
 * 5. **Cleanup**: the session leaves its room (broadcasting `userLeft` with
 *    the disconnect reason), typing state is dropped and the admission slot
 *    is released
 */

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::backend::auth::HandshakeCredentials;
use crate::backend::collab::UpdateRequest;
use crate::backend::error::BackendError;
use crate::backend::presence::SessionId;
use crate::backend::server::state::AppState;
use crate::shared::{ClientEvent, Identity, ServerEvent};

/// How long the writer may keep flushing after the reader stops
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handshake handler for `GET /ws`
pub async fn handle_socket_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(query): Query<HandshakeCredentials>,
    headers: HeaderMap,
) -> Response {
    let address = peer.ip();

    if let Err(e) = state.admission.admit(address) {
        return e.into_response();
    }

    let credentials = query.with_headers(&headers);
    let identity = match state.resolver.resolve(&credentials).await {
        Ok(identity) => identity,
        Err(e) => {
            state.admission.release(address);
            return e.into_response();
        }
    };

    tracing::info!(
        "[Socket] Upgrading {} connection from {}",
        identity.kind(),
        address
    );

    let admission = state.admission.clone();
    ws.on_failed_upgrade(move |e| {
        tracing::warn!("[Socket] Upgrade from {} failed: {}", address, e);
        admission.release(address);
    })
    .on_upgrade(move |socket| run_session(socket, state, identity, address))
}

async fn run_session(socket: WebSocket, state: AppState, identity: Identity, address: IpAddr) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (outbox, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let session_id = state.presence.register(identity, Some(address), outbox);

    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("[Socket] Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let reason = loop {
        let message = match ws_receiver.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                tracing::debug!("[Socket] Session {} transport error: {}", session_id, e);
                break "transport error";
            }
            None => break "transport closed",
        };

        match message {
            Message::Text(text) => {
                handle_frame(&state, session_id, text.as_str()).await;
            }
            Message::Binary(_) => {
                let err = BackendError::protocol("binary frames are not supported");
                state.presence.send_to(session_id, ServerEvent::from(&err));
            }
            Message::Close(_) => break "client disconnect",
            Message::Ping(_) | Message::Pong(_) => {}
        }
    };

    // Dropping the session drops the last outbox sender so the writer drains and stops
    state.presence.disconnect(session_id, reason);
    state.admission.release(address);

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }

    tracing::info!("[Socket] Session {} closed ({})", session_id, reason);
}

async fn handle_frame(state: &AppState, session_id: SessionId, frame: &str) {
    let event = match ClientEvent::from_frame(frame) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("[Socket] Rejected frame from {}: {}", session_id, e);
            let err = BackendError::from(e);
            state.presence.send_to(session_id, ServerEvent::from(&err));
            return;
        }
    };

    let notebook_id = event.notebook_id();
    if let Err(e) = dispatch(state, session_id, event).await {
        tracing::debug!(
            "[Socket] Session {} request on notebook {} failed: {}",
            session_id,
            notebook_id,
            e
        );
        state.presence.send_to(session_id, ServerEvent::from(&e));
    }
}

/// Route one client event to the presence registry or the collab service
pub async fn dispatch(state: &AppState, session_id: SessionId, event: ClientEvent) -> Result<(), BackendError> {
    match event {
        ClientEvent::JoinNotebook { notebook_id } => {
            state.collab.join_notebook(session_id, notebook_id).await?;
        }
        ClientEvent::LeaveNotebook { notebook_id } => {
            state.collab.leave_notebook(session_id, notebook_id)?;
        }
        ClientEvent::UnlockNotebook { notebook_id, password } => {
            state
                .collab
                .unlock_notebook(session_id, notebook_id, password)
                .await?;
        }
        ClientEvent::UpdateNotebook {
            notebook_id,
            title,
            content,
            version,
        } => {
            let request = UpdateRequest {
                notebook_id,
                title,
                content,
                client_version: version,
            };
            state.collab.submit_update(session_id, request).await?;
        }
        ClientEvent::Typing { notebook_id } => {
            state.presence.start_typing(session_id, notebook_id)?;
        }
        ClientEvent::StopTyping { notebook_id } => {
            state.presence.stop_typing(session_id, notebook_id)?;
        }
        ClientEvent::CursorPosition { notebook_id, position } => {
            state.presence.share_cursor(session_id, notebook_id, position)?;
        }
    }
    Ok(())
}
