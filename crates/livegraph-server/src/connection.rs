//! Per-observer connection state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Unique connection identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl Default for ConnectionId {
    fn default() -> Self {
        Self(format!("conn_{}", Uuid::now_v7()))
    }
}

impl ConnectionId {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why an enqueue was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnqueueError {
    /// The outbound queue is at capacity. The hub evicts on this.
    Full,
    /// The write loop has already exited.
    Closed,
}

/// One connected observer.
///
/// Holds the sending half of the connection's outbound queue and the
/// cancellation token both socket loops watch. Messages are `Arc`ed so a
/// broadcast clones a pointer per recipient, not the payload.
pub struct Connection {
    pub id: ConnectionId,
    tx: mpsc::Sender<Arc<String>>,
    cancel: CancellationToken,
}

impl Connection {
    /// Create a connection with a bounded outbound queue. Returns the
    /// connection and the receiving half for the write loop.
    pub fn new(capacity: usize) -> (Arc<Self>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(capacity);
        let conn = Arc::new(Self {
            id: ConnectionId::new(),
            tx,
            cancel: CancellationToken::new(),
        });
        (conn, rx)
    }

    /// Queue a message for delivery without waiting. Never blocks; a full
    /// queue is reported to the caller instead.
    pub fn enqueue(&self, message: Arc<String>) -> Result<(), EnqueueError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Tear the connection down. Both socket loops observe this and exit.
    /// Safe to call more than once.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the connection has been closed.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_ids_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
        assert!(a.0.starts_with("conn_"));
    }

    #[tokio::test]
    async fn enqueue_delivers_to_receiver() {
        let (conn, mut rx) = Connection::new(4);
        conn.enqueue(Arc::new("hello".to_string())).unwrap();
        let msg = rx.recv().await.unwrap();
        assert_eq!(*msg, "hello");
    }

    #[tokio::test]
    async fn enqueue_full_queue_reports_full() {
        let (conn, _rx) = Connection::new(2);
        conn.enqueue(Arc::new("1".to_string())).unwrap();
        conn.enqueue(Arc::new("2".to_string())).unwrap();
        assert_eq!(
            conn.enqueue(Arc::new("3".to_string())),
            Err(EnqueueError::Full)
        );
    }

    #[tokio::test]
    async fn enqueue_after_receiver_dropped_reports_closed() {
        let (conn, rx) = Connection::new(2);
        drop(rx);
        assert_eq!(
            conn.enqueue(Arc::new("1".to_string())),
            Err(EnqueueError::Closed)
        );
    }

    #[tokio::test]
    async fn close_is_idempotent_and_observable() {
        let (conn, _rx) = Connection::new(2);
        assert!(!conn.is_closed());
        conn.close();
        conn.close();
        assert!(conn.is_closed());
        // Already-cancelled token resolves immediately.
        conn.closed().await;
    }
}
