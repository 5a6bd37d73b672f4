//! WebSocket client with bounded-retry dialing.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::config::ClientConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client-side failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Every dial attempt failed. Carries the last dial error.
    #[error("failed to connect to {url} after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: tungstenite::Error,
    },

    #[error("websocket transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,
}

/// A connected publisher. Text sent here reaches every observer attached
/// to the same server.
#[derive(Debug)]
pub struct Client {
    ws: WsStream,
}

impl Client {
    /// Dial with the default retry policy.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        Self::connect_with(url, ClientConfig::default()).await
    }

    /// Dial, retrying on failure up to `config.max_attempts` total
    /// attempts with `config.retry_delay` between them. The server may
    /// still be binding its listener when the first attempt lands.
    pub async fn connect_with(url: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match connect_async(url).await {
                Ok((ws, _)) => {
                    info!(url, attempt, "connected");
                    return Ok(Self { ws });
                }
                Err(e) => {
                    if attempt >= config.max_attempts {
                        return Err(ClientError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    }
                    debug!(url, attempt, error = %e, "dial failed, retrying");
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
        }
    }

    /// Send one text frame.
    pub async fn send(&mut self, text: &str) -> Result<(), ClientError> {
        self.ws.send(Message::text(text)).await?;
        Ok(())
    }

    /// Wait for the next text frame, skipping control and binary frames.
    pub async fn receive(&mut self) -> Result<String, ClientError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.to_string()),
                Some(Ok(Message::Close(_))) | None => return Err(ClientError::Closed),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ClientError::Transport(e)),
            }
        }
    }

    /// Close the connection cleanly.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.ws.close(None).await?;
        Ok(())
    }
}
