//! Graph entities and the snapshot sent to new observers.
//!
//! Nodes are keyed by the decimal string form of their id; edges by the
//! composite `"{source}-{target}:{id}"` key. Graphics structs are display
//! hints forwarded verbatim to the front end; the core never interprets
//! them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Map key for a node id.
pub fn node_key(id: i64) -> String {
    id.to_string()
}

/// Map key for the `(source, target, id)` edge identity triple.
///
/// Multiple edges between the same pair are distinguished only by `id`.
pub fn edge_key(source: i64, target: i64, id: i64) -> String {
    format!("{source}-{target}:{id}")
}

/// Display hints for a node. Opaque to the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGraphics {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fgcolor: String,
    #[serde(default)]
    pub bgcolor: String,
    #[serde(default)]
    pub shape: String,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub width: i64,
}

/// A graph node. `id` is immutable once created; `name` may change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,
    pub name: String,
    pub group: String,
    pub size: i64,
    #[serde(default)]
    pub graphics: NodeGraphics,
}

impl Node {
    /// Key this node is stored under.
    pub fn key(&self) -> String {
        node_key(self.id)
    }
}

/// Display hints for an edge. Opaque to the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeGraphics {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A directed edge identified by `(source, target, id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: i64,
    pub target: i64,
    pub id: i64,
    pub weight: i64,
    #[serde(default)]
    pub graphics: EdgeGraphics,
}

impl Edge {
    /// Key this edge is stored under.
    pub fn key(&self) -> String {
        edge_key(self.source, self.target, self.id)
    }
}

/// Full graph state, keyed the same way the live graph stores it.
///
/// This is both the in-memory store behind the graph facade and the
/// payload of the `InitGraph` envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: HashMap<String, Node>,
    #[serde(default)]
    pub edges: HashMap<String, Edge>,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Serialize for embedding in an `InitGraph` envelope.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            context: "graph snapshot",
            source,
        })
    }

    /// Parse a snapshot out of an `InitGraph` payload.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(|source| ProtocolError::Decode {
            context: "graph snapshot",
            source,
        })
    }
}

/// On-disk dump format: flat arrays instead of keyed maps.
///
/// Written for external consumption only; the core never reads it back.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphDump {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphDump {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            context: "graph dump",
            source,
        })
    }
}
