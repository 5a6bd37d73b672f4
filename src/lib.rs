//! # livegraph
//!
//! A program-controlled graph that pushes live state changes to
//! WebSocket observers. Mutate a [`Graph`] and every attached observer
//! receives a typed JSON envelope describing the change; observers that
//! attach later get a full snapshot first, so a remote view stays
//! synchronized without polling.
//!
//! ```no_run
//! use livegraph::Graph;
//!
//! # async fn demo() -> Result<(), livegraph::GraphError> {
//! let mut graph = Graph::bind("127.0.0.1:8080").await?;
//! graph.add_node(1, "A", "group 10", 5).await?;
//! graph.add_node(2, "B", "group 10", 5).await?;
//! graph.add_edge(1, 2, 0, 1).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The workspace splits along the wire: `livegraph-core` holds the
//! protocol and data model, `livegraph-server` the hub and WebSocket
//! endpoint, `livegraph-client` the retrying dialer. This crate ties
//! them together behind [`Graph`].

mod graph;
mod telemetry;

pub use graph::{Graph, GraphError};
pub use telemetry::init_telemetry;

pub use livegraph_client::{Client, ClientConfig, ClientError};
pub use livegraph_core::{
    Edge, EdgeGraphics, Envelope, GraphSnapshot, Node, NodeGraphics, ProtocolError,
};
pub use livegraph_server::{Hub, HubHandle, OnConnect, Server, ServerConfig, ServerHandle};
