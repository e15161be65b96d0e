//! WebSocket transport adapter.
//!
//! Upgrades inbound connections, feeds text frames to the hub service, and
//! delivers outbound frames through per-connection writer channels. The
//! transport notifies the service when a connection closes; it knows nothing
//! about the protocol beyond "text in, text out".

use crate::domain::errors::HubError;
use crate::domain::registry::ConnectionId;
use crate::ports::outbound::{FrameSink, SinkError, StorageGateway};
use crate::service::HubService;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use shared_types::HubFrame;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Outbound side of the WebSocket transport.
///
/// Holds one unbounded writer channel per attached connection; implements
/// [`FrameSink`] by serializing into that channel. Fire-and-forget: a send
/// only fails if the connection is already gone.
#[derive(Default)]
pub struct WsTransport {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<String>>,
}

impl WsTransport {
    /// Create a transport with no attached connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently attached connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn attach(&self, connection: ConnectionId, writer: mpsc::UnboundedSender<String>) {
        self.connections.insert(connection, writer);
    }

    fn detach(&self, connection: &ConnectionId) {
        self.connections.remove(connection);
    }
}

impl FrameSink for WsTransport {
    fn send(&self, connection: ConnectionId, frame: &HubFrame) -> Result<(), SinkError> {
        let encoded = serde_json::to_string(frame).map_err(|_| SinkError::Encoding)?;
        match self.connections.get(&connection) {
            Some(writer) => writer.send(encoded).map_err(|_| SinkError::Disconnected),
            None => Err(SinkError::Disconnected),
        }
    }
}

struct WsState<S> {
    service: Arc<HubService<S, WsTransport>>,
    transport: Arc<WsTransport>,
}

// Manual impl: deriving would demand S: Clone.
impl<S> Clone for WsState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            transport: Arc::clone(&self.transport),
        }
    }
}

/// Bind `addr` and serve validator WebSocket connections until failure.
pub async fn serve<S>(
    service: Arc<HubService<S, WsTransport>>,
    transport: Arc<WsTransport>,
    addr: SocketAddr,
) -> Result<(), HubError>
where
    S: StorageGateway + 'static,
{
    let state = WsState { service, transport };
    let app = Router::new()
        .route("/", get(upgrade_handler::<S>))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Hub listening for validator connections");

    axum::serve(listener, app)
        .await
        .map_err(|err| HubError::Transport(err.to_string()))
}

async fn upgrade_handler<S>(
    ws: WebSocketUpgrade,
    State(state): State<WsState<S>>,
) -> impl IntoResponse
where
    S: StorageGateway + 'static,
{
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket<S>(socket: WebSocket, state: WsState<S>)
where
    S: StorageGateway + 'static,
{
    let connection = ConnectionId::new();
    info!(%connection, "Validator connection opened");

    let (mut ws_writer, mut ws_reader) = socket.split();
    let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<String>();
    state.transport.attach(connection, writer_tx);

    let writer = tokio::spawn(async move {
        while let Some(text) = writer_rx.recv().await {
            if ws_writer.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = ws_reader.next().await {
        match message {
            Ok(Message::Text(text)) => state.service.handle_frame(connection, &text).await,
            Ok(Message::Close(_)) => break,
            // Binary, ping, and pong are not part of the protocol
            Ok(_) => {}
            Err(err) => {
                debug!(%connection, error = %err, "Connection error");
                break;
            }
        }
    }

    state.transport.detach(&connection);
    state.service.handle_disconnect(connection);
    writer.abort();
    info!(%connection, "Validator connection closed");
}
