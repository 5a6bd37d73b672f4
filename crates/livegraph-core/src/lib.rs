//! # livegraph-core
//!
//! Wire protocol and graph data model shared by the server, client,
//! and graph facade:
//!
//! - [`Envelope`]: tagged JSON commands sent to observers
//! - [`Node`] / [`Edge`]: graph entities with display hints
//! - [`GraphSnapshot`]: full-graph state pushed to new observers
//! - [`ProtocolError`]: encode/decode failures

pub mod errors;
pub mod model;
pub mod protocol;

pub use errors::ProtocolError;
pub use model::{
    edge_key, node_key, Edge, EdgeGraphics, GraphDump, GraphSnapshot, Node, NodeGraphics,
};
pub use protocol::Envelope;
