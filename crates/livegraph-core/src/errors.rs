//! Protocol-level error types.

use thiserror::Error;

/// Serialization failures at the wire boundary.
///
/// Encode failures carry what was being encoded so the caller's log line
/// says more than "serde error". A failed encode never mutates graph
/// state; callers surface the error and move on.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Failed to serialize an envelope or snapshot to JSON.
    #[error("failed to encode {context}: {source}")]
    Encode {
        /// What was being encoded (e.g. `"AddNode envelope"`).
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to parse an incoming message.
    #[error("failed to decode {context}: {source}")]
    Decode {
        /// What was being decoded.
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_serde_error() -> serde_json::Error {
        serde_json::from_str::<i64>("not a number").unwrap_err()
    }

    #[test]
    fn encode_error_display_includes_context() {
        let err = ProtocolError::Encode {
            context: "AddNode envelope",
            source: sample_serde_error(),
        };
        let msg = err.to_string();
        assert!(msg.contains("encode"));
        assert!(msg.contains("AddNode envelope"));
    }

    #[test]
    fn decode_error_display_includes_context() {
        let err = ProtocolError::Decode {
            context: "envelope",
            source: sample_serde_error(),
        };
        assert!(err.to_string().contains("decode"));
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;
        let err = ProtocolError::Decode {
            context: "snapshot",
            source: sample_serde_error(),
        };
        assert!(err.source().is_some());
    }
}
