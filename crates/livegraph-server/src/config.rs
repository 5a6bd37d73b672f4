//! Server configuration.

use serde::Deserialize;

/// Configuration for the broadcast server.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind. Zero picks an ephemeral port.
    pub port: u16,
    /// Capacity of each connection's outbound queue. A connection whose
    /// queue is full when a broadcast arrives is evicted.
    pub send_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            send_queue_capacity: 256,
        }
    }
}

impl ServerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
