//! Application seam for received items.

use async_trait::async_trait;
use trade_types::TradeItem;

/// Receives the item a trade produced.
///
/// Called at most once per trade session. Delivery of an already-known
/// item must be a no-op on the application side: the relay redelivers
/// rather than lose a result, and the controller reconnects as a fresh
/// session after any failure.
#[async_trait]
pub trait ItemSink: Send + Sync {
    /// Persist or apply the received item.
    async fn deliver(&self, item: TradeItem) -> anyhow::Result<()>;
}
