//! # livegraph-client
//!
//! Outbound WebSocket client used by the graph facade to publish
//! mutations to its own broadcast server. Dialing retries a bounded
//! number of times so the client can start while the server's listener
//! is still coming up.

pub mod client;
pub mod config;

pub use client::{Client, ClientError};
pub use config::{ClientConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
