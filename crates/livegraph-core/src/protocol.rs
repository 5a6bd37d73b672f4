//! Wire envelopes broadcast to observers.
//!
//! One JSON object per message, tagged on `command`. A new observer
//! receives exactly one `InitGraph` before any incremental command;
//! everything after is one envelope per graph mutation.

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// A tagged protocol command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Envelope {
    /// Full-graph snapshot, sent once when an observer attaches.
    /// `graph` is a JSON-encoded [`crate::GraphSnapshot`].
    InitGraph { graph: String },
    /// A node was added.
    AddNode {
        id: i64,
        name: String,
        group: String,
        size: i64,
    },
    /// A node is about to be deleted.
    RemoveNode { id: i64 },
    /// An edge was added.
    AddEdge {
        source: i64,
        target: i64,
        id: i64,
        weight: i64,
    },
    /// An edge is about to be deleted.
    RemoveEdge { source: i64, target: i64, id: i64 },
    /// A node was renamed.
    SetNodeName { id: i64, name: String },
}

impl Envelope {
    /// The wire name of this command.
    pub fn command(&self) -> &'static str {
        match self {
            Envelope::InitGraph { .. } => "InitGraph",
            Envelope::AddNode { .. } => "AddNode",
            Envelope::RemoveNode { .. } => "RemoveNode",
            Envelope::AddEdge { .. } => "AddEdge",
            Envelope::RemoveEdge { .. } => "RemoveEdge",
            Envelope::SetNodeName { .. } => "SetNodeName",
        }
    }

    /// Serialize to a single-line JSON message.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            context: "envelope",
            source,
        })
    }

    /// Parse a received message.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(|source| ProtocolError::Decode {
            context: "envelope",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_wire_shape() {
        let env = Envelope::AddNode {
            id: 1,
            name: "a".into(),
            group: "group 10".into(),
            size: 5,
        };
        let json = env.encode().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["command"], "AddNode");
        assert_eq!(parsed["id"], 1);
        assert_eq!(parsed["name"], "a");
        assert_eq!(parsed["group"], "group 10");
        assert_eq!(parsed["size"], 5);
    }

    #[test]
    fn add_edge_wire_shape() {
        let env = Envelope::AddEdge {
            source: 1,
            target: 2,
            id: 0,
            weight: 1,
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(parsed["command"], "AddEdge");
        assert_eq!(parsed["source"], 1);
        assert_eq!(parsed["target"], 2);
        assert_eq!(parsed["id"], 0);
        assert_eq!(parsed["weight"], 1);
    }

    #[test]
    fn remove_node_wire_shape() {
        let parsed: serde_json::Value =
            serde_json::from_str(&Envelope::RemoveNode { id: 9 }.encode().unwrap()).unwrap();
        assert_eq!(parsed["command"], "RemoveNode");
        assert_eq!(parsed["id"], 9);
    }

    #[test]
    fn set_node_name_wire_shape() {
        let env = Envelope::SetNodeName {
            id: 3,
            name: "renamed".into(),
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(parsed["command"], "SetNodeName");
        assert_eq!(parsed["name"], "renamed");
    }

    #[test]
    fn init_graph_carries_embedded_snapshot() {
        let env = Envelope::InitGraph {
            graph: r#"{"nodes":{},"edges":{}}"#.into(),
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(parsed["command"], "InitGraph");
        // The payload is a string, not a nested object.
        assert!(parsed["graph"].is_string());
    }

    #[test]
    fn encode_is_single_line() {
        let env = Envelope::AddNode {
            id: 1,
            name: "multi\nline".into(),
            group: "g".into(),
            size: 1,
        };
        let json = env.encode().unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn decode_roundtrip_all_commands() {
        let envelopes = vec![
            Envelope::InitGraph { graph: "{}".into() },
            Envelope::AddNode {
                id: 1,
                name: "a".into(),
                group: "g".into(),
                size: 2,
            },
            Envelope::RemoveNode { id: 1 },
            Envelope::AddEdge {
                source: 1,
                target: 2,
                id: 0,
                weight: 1,
            },
            Envelope::RemoveEdge {
                source: 1,
                target: 2,
                id: 0,
            },
            Envelope::SetNodeName {
                id: 1,
                name: "b".into(),
            },
        ];
        for env in envelopes {
            let back = Envelope::decode(&env.encode().unwrap()).unwrap();
            assert_eq!(back, env);
        }
    }

    #[test]
    fn command_names() {
        assert_eq!(Envelope::RemoveNode { id: 1 }.command(), "RemoveNode");
        assert_eq!(
            Envelope::RemoveEdge {
                source: 1,
                target: 2,
                id: 0
            }
            .command(),
            "RemoveEdge"
        );
    }

    #[test]
    fn decode_unknown_command_fails() {
        assert!(Envelope::decode(r#"{"command":"Nope"}"#).is_err());
    }

    #[test]
    fn decode_invalid_json_fails() {
        let err = Envelope::decode("{{{").unwrap_err();
        assert!(err.to_string().contains("decode"));
    }
}
