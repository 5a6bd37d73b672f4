//! The live graph: an in-memory node/edge store whose mutations are
//! broadcast to every connected observer.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use livegraph_client::{Client, ClientError};
use livegraph_core::{
    edge_key, node_key, Edge, EdgeGraphics, Envelope, GraphDump, GraphSnapshot, Node,
    NodeGraphics, ProtocolError,
};
use livegraph_server::{
    Connection, Hub, OnConnect, Server, ServerConfig, ServerError, ServerHandle,
};

/// Failures surfaced by graph construction and mutation.
///
/// Mutation no-ops (duplicate add, missing-key remove or rename) are not
/// errors; they return `Ok` and change nothing.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("invalid listen address {addr:?}, expected host:port")]
    Addr { addr: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to write graph dump to {path}: {source}")]
    Dump {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Connect hook that hands each new observer the full graph before the
/// hub starts fanning incremental updates to it.
struct SnapshotOnConnect {
    state: Arc<RwLock<GraphSnapshot>>,
}

#[async_trait]
impl OnConnect for SnapshotOnConnect {
    async fn on_connect(&self, conn: &Connection) -> Result<(), ProtocolError> {
        let graph = self.state.read().encode()?;
        let message = Envelope::InitGraph { graph }.encode()?;
        // The queue is freshly created and empty; this cannot be full.
        let _ = conn.enqueue(Arc::new(message));
        Ok(())
    }
}

/// A mutable graph served live over WebSocket.
///
/// [`Graph::bind`] starts an embedded broadcast server and dials it with
/// an internal client. Every mutation validates against the key space,
/// publishes one [`Envelope`] through that client, then applies the
/// change to the store. Observers that attach at any point receive an
/// `InitGraph` snapshot first, so they reconstruct the same state the
/// store holds.
pub struct Graph {
    state: Arc<RwLock<GraphSnapshot>>,
    client: Client,
    server: ServerHandle,
}

impl Graph {
    /// Start a graph serving on `addr` (`host:port`; port 0 picks an
    /// ephemeral port).
    pub async fn bind(addr: &str) -> Result<Self, GraphError> {
        let (host, port) = addr.rsplit_once(':').ok_or_else(|| GraphError::Addr {
            addr: addr.to_string(),
        })?;
        let port: u16 = port.parse().map_err(|_| GraphError::Addr {
            addr: addr.to_string(),
        })?;

        let state = Arc::new(RwLock::new(GraphSnapshot::default()));
        let hook = Arc::new(SnapshotOnConnect {
            state: Arc::clone(&state),
        });

        let config = ServerConfig {
            host: host.to_string(),
            port,
            ..Default::default()
        };
        let server = Server::new(config, Hub::spawn())
            .with_on_connect(hook)
            .listen()
            .await?;
        let client = Client::connect(&server.ws_url()).await?;

        Ok(Self {
            state,
            client,
            server,
        })
    }

    /// Address the embedded server is listening on.
    pub fn server_info(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// WebSocket URL observers should dial.
    pub fn ws_url(&self) -> String {
        self.server.ws_url()
    }

    /// Number of currently attached observers, the internal publishing
    /// client included.
    pub fn observer_count(&self) -> usize {
        self.server.hub().connection_count()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().edge_count()
    }

    /// Copy of the current graph state.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.state.read().clone()
    }

    /// Add a node. Silently ignored if the id already exists.
    pub async fn add_node(
        &mut self,
        id: i64,
        name: &str,
        group: &str,
        size: i64,
    ) -> Result<(), GraphError> {
        self.add_node_with_graphics(id, name, group, size, NodeGraphics::default())
            .await
    }

    /// Add a node with display hints. Silently ignored if the id already
    /// exists.
    pub async fn add_node_with_graphics(
        &mut self,
        id: i64,
        name: &str,
        group: &str,
        size: i64,
        graphics: NodeGraphics,
    ) -> Result<(), GraphError> {
        let key = node_key(id);
        if self.state.read().nodes.contains_key(&key) {
            debug!(id, "node already present, skipping add");
            return Ok(());
        }
        self.publish(Envelope::AddNode {
            id,
            name: name.to_string(),
            group: group.to_string(),
            size,
        })
        .await?;
        self.state.write().nodes.insert(
            key,
            Node {
                id,
                name: name.to_string(),
                group: group.to_string(),
                size,
                graphics,
            },
        );
        Ok(())
    }

    /// Remove a node. No-op if absent.
    ///
    /// TODO: also remove edges incident to the node; until then observers
    /// keep dangling edges after a node disappears.
    pub async fn remove_node(&mut self, id: i64) -> Result<(), GraphError> {
        let key = node_key(id);
        if !self.state.read().nodes.contains_key(&key) {
            debug!(id, "node absent, skipping remove");
            return Ok(());
        }
        self.publish(Envelope::RemoveNode { id }).await?;
        self.state.write().nodes.remove(&key);
        Ok(())
    }

    /// Add an edge. Silently ignored if the `(source, target, id)` triple
    /// already exists.
    pub async fn add_edge(
        &mut self,
        source: i64,
        target: i64,
        id: i64,
        weight: i64,
    ) -> Result<(), GraphError> {
        self.add_edge_with_graphics(source, target, id, weight, EdgeGraphics::default())
            .await
    }

    /// Add an edge with display hints. Silently ignored if the triple
    /// already exists.
    pub async fn add_edge_with_graphics(
        &mut self,
        source: i64,
        target: i64,
        id: i64,
        weight: i64,
        graphics: EdgeGraphics,
    ) -> Result<(), GraphError> {
        let key = edge_key(source, target, id);
        if self.state.read().edges.contains_key(&key) {
            debug!(key = %key, "edge already present, skipping add");
            return Ok(());
        }
        // Weight is pinned to 1 whatever the caller passes.
        // TODO: confirm whether caller-supplied weights should be honored.
        let _ = weight;
        let weight = 1;
        self.publish(Envelope::AddEdge {
            source,
            target,
            id,
            weight,
        })
        .await?;
        self.state.write().edges.insert(
            key,
            Edge {
                source,
                target,
                id,
                weight,
                graphics,
            },
        );
        Ok(())
    }

    /// Remove an edge. No-op if absent.
    pub async fn remove_edge(
        &mut self,
        source: i64,
        target: i64,
        id: i64,
    ) -> Result<(), GraphError> {
        let key = edge_key(source, target, id);
        if !self.state.read().edges.contains_key(&key) {
            debug!(key = %key, "edge absent, skipping remove");
            return Ok(());
        }
        self.publish(Envelope::RemoveEdge { source, target, id }).await?;
        self.state.write().edges.remove(&key);
        Ok(())
    }

    /// Rename a node. No-op if absent.
    pub async fn rename_node(&mut self, id: i64, new_name: &str) -> Result<(), GraphError> {
        let key = node_key(id);
        if !self.state.read().nodes.contains_key(&key) {
            debug!(id, "node absent, skipping rename");
            return Ok(());
        }
        self.publish(Envelope::SetNodeName {
            id,
            name: new_name.to_string(),
        })
        .await?;
        if let Some(node) = self.state.write().nodes.get_mut(&key) {
            node.name = new_name.to_string();
        }
        Ok(())
    }

    /// Write the full graph as `{nodes: [...], edges: [...]}` JSON for
    /// external consumption. Never read back.
    pub fn dump_json(&self, path: &Path) -> Result<(), GraphError> {
        let dump = {
            let state = self.state.read();
            GraphDump {
                nodes: state.nodes.values().cloned().collect(),
                edges: state.edges.values().cloned().collect(),
            }
        };
        let json = dump.encode()?;
        std::fs::write(path, json).map_err(|source| GraphError::Dump {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Close the internal client and stop the embedded server.
    pub async fn shutdown(self) {
        let _ = self.client.close().await;
        self.server.shutdown().await;
    }

    /// Encode and send one envelope through the internal client. The
    /// store is only mutated after this succeeds, so a failed publish
    /// leaves graph state unchanged.
    async fn publish(&mut self, envelope: Envelope) -> Result<(), GraphError> {
        let message = envelope.encode()?;
        self.client.send(&message).await?;
        Ok(())
    }
}
