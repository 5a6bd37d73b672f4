//! WebSocket endpoint and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use livegraph_core::ProtocolError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::hub::HubHandle;

/// Startup failures.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Hook invoked for each new connection before it joins the hub.
///
/// Whatever the hook enqueues is delivered ahead of any broadcast the
/// connection will ever see, since registration happens only after the
/// hook returns. An error drops the connection without registering it.
#[async_trait]
pub trait OnConnect: Send + Sync {
    async fn on_connect(&self, conn: &Connection) -> Result<(), ProtocolError>;
}

/// Shared state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub send_queue_capacity: usize,
    pub on_connect: Option<Arc<dyn OnConnect>>,
}

/// The broadcast server, not yet listening.
pub struct Server {
    config: ServerConfig,
    hub: HubHandle,
    on_connect: Option<Arc<dyn OnConnect>>,
}

impl Server {
    pub fn new(config: ServerConfig, hub: HubHandle) -> Self {
        Self {
            config,
            hub,
            on_connect: None,
        }
    }

    /// Install the new-connection hook.
    pub fn with_on_connect(mut self, hook: Arc<dyn OnConnect>) -> Self {
        self.on_connect = Some(hook);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: self.hub.clone(),
            send_queue_capacity: self.config.send_queue_capacity,
            on_connect: self.on_connect.clone(),
        };
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(CorsLayer::permissive())
    }

    /// Bind and start serving. Returns a handle for address lookup and
    /// shutdown.
    pub async fn listen(self) -> Result<ServerHandle, ServerError> {
        let addr = self.config.bind_addr();
        let listener =
            tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|source| ServerError::Bind {
                    addr: addr.clone(),
                    source,
                })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr,
            source,
        })?;

        let router = self.router();
        let shutdown = CancellationToken::new();
        let serve_token = shutdown.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { serve_token.cancelled().await })
                .await
                .ok();
        });

        info!(addr = %local_addr, "graph broadcast server started");

        Ok(ServerHandle {
            local_addr,
            hub: self.hub,
            shutdown,
            task,
        })
    }
}

/// Handle to a running server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    hub: HubHandle,
    shutdown: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// WebSocket URL observers should dial.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.local_addr)
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Stop accepting connections and wait for the serve task to finish.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "connections": state.hub.connection_count(),
    }))
}

/// Drive one observer connection through its lifecycle.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (conn, rx) = Connection::new(state.send_queue_capacity);
    let conn_id = conn.id.clone();
    info!(conn_id = %conn_id, "observer connected");

    // The hook's messages must precede every broadcast, so it runs
    // before the hub learns about this connection.
    if let Some(hook) = &state.on_connect {
        if let Err(e) = hook.on_connect(&conn).await {
            warn!(conn_id = %conn_id, error = %e, "connect hook failed, dropping connection");
            return;
        }
    }

    state.hub.register(Arc::clone(&conn));

    let (ws_tx, ws_rx) = socket.split();
    let writer = tokio::spawn(write_loop(ws_tx, rx, Arc::clone(&conn)));
    let reader = tokio::spawn(read_loop(ws_rx, state.hub.clone(), Arc::clone(&conn)));

    tokio::select! {
        _ = writer => {}
        _ = reader => {}
    }

    conn.close();
    state.hub.unregister(conn_id.clone());
    info!(conn_id = %conn_id, "observer disconnected");
}

/// Forward queued messages to the socket until the queue or socket closes.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Arc<String>>,
    conn: Arc<Connection>,
) {
    loop {
        tokio::select! {
            _ = conn.closed() => break,
            msg = rx.recv() => match msg {
                Some(text) => {
                    if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
    let _ = ws_tx.close().await;
}

/// Republish inbound text frames to every observer. This is the path a
/// publishing client's mutations take to reach the fan-out.
async fn read_loop(mut ws_rx: SplitStream<WebSocket>, hub: HubHandle, conn: Arc<Connection>) {
    loop {
        tokio::select! {
            _ = conn.closed() => break,
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    hub.broadcast(Arc::new(text.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => break,
                // axum answers pings itself; binary frames are ignored.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(conn_id = %conn.id, error = %e, "socket read error");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::Hub;

    #[tokio::test]
    async fn router_builds_with_routes() {
        let server = Server::new(ServerConfig::default(), Hub::spawn());
        let _router = server.router();
    }

    #[tokio::test]
    async fn server_binds_ephemeral_port() {
        let server = Server::new(ServerConfig::default(), Hub::spawn());
        let handle = server.listen().await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        assert!(handle.ws_url().starts_with("ws://127.0.0.1:"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn health_reports_connection_count() {
        let server = Server::new(ServerConfig::default(), Hub::spawn());
        let handle = server.listen().await.unwrap();

        let url = format!("http://{}/health", handle.local_addr());
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn bind_failure_surfaces_as_error() {
        let config = ServerConfig {
            host: "255.255.255.255".into(),
            ..Default::default()
        };
        let result = Server::new(config, Hub::spawn()).listen().await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
