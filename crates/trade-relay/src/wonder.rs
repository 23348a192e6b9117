//! Anonymous Wonder Trade pool.
//!
//! Any two waiting connections get paired; there is no negotiation. The
//! whole pool sits behind one mutex so a pairing updates both entries in
//! a single atomic step; no entry is ever half-paired.
//!
//! Entries stay in the pool until the owning connection disconnects.
//! Delivery happens when the owner's dispatch loop observes the pairing,
//! so a missed tick just means redelivery on the next one (at-least-once;
//! the client acts once and disconnects, making that harmless).

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;
use trade_types::{ConnectionId, TradeItem};

/// One waiting or completed pool entry.
#[derive(Debug, Clone)]
struct WonderTradeEntry {
    /// The item this connection is giving away. Unchanged by pairing.
    item: TradeItem,
    /// The partner's item, set at the moment of pairing.
    received: Option<TradeItem>,
    /// The connection this entry was paired with, empty while waiting.
    traded_with: Option<ConnectionId>,
}

/// Result of submitting an item to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No partner was waiting; the entry is queued.
    Queued,
    /// Paired with the given waiting connection.
    Paired(ConnectionId),
    /// The connection already has an entry; the submission is a no-op.
    AlreadyEntered,
}

/// Pool of connections waiting for (or having completed) a Wonder Trade.
#[derive(Debug, Default)]
pub struct WonderTradePool {
    entries: Mutex<HashMap<ConnectionId, WonderTradeEntry>>,
}

impl WonderTradePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an item to the pool.
    ///
    /// Pairs with the first unpaired entry of a different connection, in
    /// no particular order; otherwise queues the submitter. A connection
    /// that already has an entry is left untouched.
    pub fn submit(&self, id: ConnectionId, item: TradeItem) -> SubmitOutcome {
        let mut entries = self.entries.lock();

        if entries.contains_key(&id) {
            debug!(connection = %id, "duplicate wonder trade submission ignored");
            return SubmitOutcome::AlreadyEntered;
        }

        let partner = entries
            .iter()
            .find(|(other, entry)| **other != id && entry.traded_with.is_none())
            .map(|(other, _)| *other);

        let paired = partner.and_then(|partner_id| {
            // Both sides of the pairing are written under the same lock
            // guard.
            let entry = entries.get_mut(&partner_id)?;
            entry.traded_with = Some(id);
            entry.received = Some(item.clone());
            Some((partner_id, entry.item.clone()))
        });

        match paired {
            Some((partner_id, partner_item)) => {
                entries.insert(
                    id,
                    WonderTradeEntry {
                        item,
                        received: Some(partner_item),
                        traded_with: Some(partner_id),
                    },
                );
                debug!(connection = %id, partner = %partner_id, "wonder trade paired");
                SubmitOutcome::Paired(partner_id)
            }
            None => {
                entries.insert(
                    id,
                    WonderTradeEntry {
                        item,
                        received: None,
                        traded_with: None,
                    },
                );
                debug!(connection = %id, "queued for wonder trade");
                SubmitOutcome::Queued
            }
        }
    }

    /// The item this connection received, if its entry has been paired.
    ///
    /// Repeated polls keep returning the item; the entry is only removed
    /// on disconnect.
    pub fn poll(&self, id: ConnectionId) -> Option<TradeItem> {
        let entries = self.entries.lock();
        let entry = entries.get(&id)?;
        entry.traded_with?;
        entry.received.clone()
    }

    /// Whether a connection has an entry in the pool.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Who a connection was paired with, if anyone.
    pub fn traded_with(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.entries.lock().get(&id).and_then(|e| e.traded_with)
    }

    /// Drop a connection's entry, paired or not. A waiting peer simply
    /// never sees a match; an already-paired peer keeps its own entry
    /// (and the received item stored in it).
    pub fn remove(&self, id: ConnectionId) {
        if self.entries.lock().remove(&id).is_some() {
            debug!(connection = %id, "wonder trade entry removed");
        }
    }

    /// Number of entries currently in the pool.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the pool has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
