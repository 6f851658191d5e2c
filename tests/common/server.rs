//! Live server and WebSocket client helpers

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use notecollab::backend::server::build_app;
use notecollab::shared::{ClientEvent, ServerEvent};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::fixtures::TestApp;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Server bound to an ephemeral loopback port
pub struct TestServer {
    pub addr: SocketAddr,
    pub app: TestApp,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(max_connections: usize) -> Self {
        let app = TestApp::with_max_connections(max_connections);
        let router = build_app(app.state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");

        let task = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("test server crashed");
        });

        Self { addr, app, task }
    }

    /// `ws://` URL for `/ws` with an optional query string (without `?`)
    pub fn ws_url(&self, query: &str) -> String {
        if query.is_empty() {
            format!("ws://{}/ws", self.addr)
        } else {
            format!("ws://{}/ws?{}", self.addr, query)
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(url: &str) -> Result<Self, tungstenite::Error> {
        let (stream, _) = connect_async(url).await?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, event: &ClientEvent) {
        let frame = event.to_frame().expect("client event encodes");
        self.stream
            .send(Message::text(frame))
            .await
            .expect("Failed to send frame");
    }

    pub async fn send_raw(&mut self, frame: &str) {
        self.stream
            .send(Message::text(frame.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next server event; panics after a few seconds of silence
    pub async fn recv(&mut self) -> ServerEvent {
        loop {
            let message = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a server event")
                .expect("socket closed")
                .expect("socket error");
            if let Message::Text(text) = message {
                return ServerEvent::from_frame(text.as_str()).expect("server frame decodes");
            }
        }
    }

    /// Skip events until one named `name` arrives
    pub async fn recv_named(&mut self, name: &str) -> ServerEvent {
        loop {
            let event = self.recv().await;
            if event.name() == name {
                return event;
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

/// HTTP status of a rejected handshake
pub fn handshake_status(err: &tungstenite::Error) -> Option<u16> {
    match err {
        tungstenite::Error::Http(response) => Some(response.status().as_u16()),
        _ => None,
    }
}
