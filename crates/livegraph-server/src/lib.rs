//! # livegraph-server
//!
//! WebSocket broadcast server. Observers connect to `/ws`; everything a
//! publishing client sends is fanned out to every observer through the
//! [`hub::Hub`] dispatch loop. Slow observers never stall a broadcast;
//! they are evicted when their bounded send queue fills.

pub mod config;
pub mod connection;
pub mod hub;
pub mod server;

pub use config::ServerConfig;
pub use connection::{Connection, ConnectionId, EnqueueError};
pub use hub::{Hub, HubHandle};
pub use server::{OnConnect, Server, ServerError, ServerHandle};
