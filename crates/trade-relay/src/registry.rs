//! Connection registry and lifecycle.
//!
//! Tracks every live connection, its declared mode, its outbound event
//! queue, and the waker its dispatch loop sleeps on. The registry owns
//! connections exclusively; mode stores (pool, session store) only ever
//! hold connection ids.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};
use trade_types::{ConnectionId, ServerEvent, TradeMode};

use crate::error::{RelayError, RelayResult};

/// Registry-side record of one live connection.
#[derive(Debug)]
struct Connection {
    mode: TradeMode,
    outbox: mpsc::Sender<ServerEvent>,
    wake: Arc<Notify>,
}

/// Tracks every live client connection and which matching mode it
/// requested.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection with its outbound event queue.
    ///
    /// Returns the waker its dispatch loop should sleep on.
    pub fn register(
        &self,
        id: ConnectionId,
        outbox: mpsc::Sender<ServerEvent>,
    ) -> Arc<Notify> {
        let wake = Arc::new(Notify::new());
        self.connections.insert(
            id,
            Connection {
                mode: TradeMode::None,
                outbox,
                wake: Arc::clone(&wake),
            },
        );
        debug!(connection = %id, "connection registered");
        wake
    }

    /// Remove a connection.
    ///
    /// Fails with [`RelayError::UnknownConnection`] if the id was never
    /// registered or already removed; callers log that and move on.
    pub fn deregister(&self, id: ConnectionId) -> RelayResult<()> {
        match self.connections.remove(&id) {
            Some((_, conn)) => {
                // Unblock the dispatch loop so it can observe removal
                // and terminate.
                conn.wake.notify_one();
                debug!(connection = %id, "connection deregistered");
                Ok(())
            }
            None => Err(RelayError::UnknownConnection(id)),
        }
    }

    /// Declare the matching mode for a connection.
    pub fn set_mode(&self, id: ConnectionId, mode: TradeMode) -> RelayResult<()> {
        let mut conn = self
            .connections
            .get_mut(&id)
            .ok_or(RelayError::UnknownConnection(id))?;
        conn.mode = mode;
        Ok(())
    }

    /// The mode a connection declared, if it is still live.
    pub fn mode(&self, id: ConnectionId) -> Option<TradeMode> {
        self.connections.get(&id).map(|c| c.mode)
    }

    /// Whether a connection is still live.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Waker for a connection's dispatch loop.
    pub fn waker(&self, id: ConnectionId) -> Option<Arc<Notify>> {
        self.connections.get(&id).map(|c| Arc::clone(&c.wake))
    }

    /// Wake a connection's dispatch loop after a store mutation that may
    /// concern it. Waking a departed connection is a no-op.
    pub fn wake(&self, id: ConnectionId) {
        if let Some(conn) = self.connections.get(&id) {
            conn.wake.notify_one();
        }
    }

    /// Queue an event for delivery to a connection.
    ///
    /// Queueing never blocks; a full or closed queue means the socket is
    /// stuck or gone, which the transport layer handles by tearing the
    /// connection down.
    pub fn send(&self, id: ConnectionId, event: ServerEvent) -> RelayResult<()> {
        let conn = self
            .connections
            .get(&id)
            .ok_or(RelayError::UnknownConnection(id))?;
        conn.outbox.try_send(event).map_err(|e| {
            warn!(connection = %id, error = %e, "dropping outbound event");
            RelayError::Outbox(id)
        })
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are live.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
