//! Connection hub: serialized fan-out to all observers.
//!
//! All membership changes and broadcasts flow through one dispatch loop,
//! so every observer sees the same message order and no broadcast ever
//! interleaves with a register or unregister. Broadcasting never waits on
//! a slow observer; a full outbound queue gets the observer evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionId, EnqueueError};

enum HubCommand {
    Register(Arc<Connection>),
    Unregister(ConnectionId),
    Broadcast(Arc<String>),
}

/// Counters shared between the dispatch loop and its handles.
#[derive(Debug, Default)]
pub struct HubStats {
    connections: AtomicUsize,
    evictions: AtomicU64,
}

/// The dispatch loop's state. Created with [`Hub::spawn`]; only the loop
/// itself ever touches the connection table.
pub struct Hub {
    rx: mpsc::UnboundedReceiver<HubCommand>,
    connections: HashMap<ConnectionId, Arc<Connection>>,
    stats: Arc<HubStats>,
}

/// Cloneable handle for talking to a running hub.
///
/// All operations are fire-and-forget: they enqueue a command for the
/// dispatch loop and return immediately. Once the loop has shut down the
/// commands become no-ops.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
    stats: Arc<HubStats>,
}

impl Hub {
    /// Start the dispatch loop on a new task and return a handle to it.
    /// The loop runs until every handle has been dropped.
    pub fn spawn() -> HubHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(HubStats::default());
        let hub = Hub {
            rx,
            connections: HashMap::new(),
            stats: Arc::clone(&stats),
        };
        tokio::spawn(hub.run());
        HubHandle { tx, stats }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                HubCommand::Register(conn) => self.register(conn),
                HubCommand::Unregister(id) => self.unregister(&id),
                HubCommand::Broadcast(message) => self.broadcast(message),
            }
        }
        debug!("hub dispatch loop stopped");
    }

    fn register(&mut self, conn: Arc<Connection>) {
        let id = conn.id.clone();
        if self.connections.insert(id.clone(), conn).is_none() {
            let _ = self.stats.connections.fetch_add(1, Ordering::Relaxed);
        }
        info!(conn_id = %id, total = self.connections.len(), "observer registered");
    }

    fn unregister(&mut self, id: &ConnectionId) {
        if let Some(conn) = self.connections.remove(id) {
            conn.close();
            let _ = self.stats.connections.fetch_sub(1, Ordering::Relaxed);
            info!(conn_id = %id, total = self.connections.len(), "observer unregistered");
        }
    }

    fn broadcast(&mut self, message: Arc<String>) {
        let mut to_remove = Vec::new();
        for conn in self.connections.values() {
            match conn.enqueue(Arc::clone(&message)) {
                Ok(()) => {}
                Err(EnqueueError::Full) => {
                    counter!("livegraph_broadcast_evictions_total").increment(1);
                    let _ = self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                    warn!(conn_id = %conn.id, "send queue full, evicting observer");
                    to_remove.push(conn.id.clone());
                }
                Err(EnqueueError::Closed) => {
                    debug!(conn_id = %conn.id, "send queue closed, removing observer");
                    to_remove.push(conn.id.clone());
                }
            }
        }
        debug!(
            recipients = self.connections.len() - to_remove.len(),
            msg_len = message.len(),
            "broadcast"
        );
        for id in &to_remove {
            self.unregister(id);
        }
    }
}

impl HubHandle {
    /// Add an observer to the fan-out set.
    pub fn register(&self, conn: Arc<Connection>) {
        let _ = self.tx.send(HubCommand::Register(conn));
    }

    /// Drop an observer. Safe to call for an id the hub no longer holds.
    pub fn unregister(&self, id: ConnectionId) {
        let _ = self.tx.send(HubCommand::Unregister(id));
    }

    /// Queue a message for delivery to every current observer.
    pub fn broadcast(&self, message: Arc<String>) {
        let _ = self.tx.send(HubCommand::Broadcast(message));
    }

    /// Number of registered observers.
    pub fn connection_count(&self) -> usize {
        self.stats.connections.load(Ordering::Relaxed)
    }

    /// Total observers evicted for a full send queue.
    pub fn evictions(&self) -> u64 {
        self.stats.evictions.load(Ordering::Relaxed)
    }
}
