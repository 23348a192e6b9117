//! Wonder Trade controller: submit one item, receive one item.

use tracing::{debug, info};
use trade_types::{ClientEvent, ServerEvent, TradeItem, TradeMode};

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::ClientError;
use crate::sink::ItemSink;

/// How a Wonder Trade session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WonderOutcome {
    /// Matched; the received item was delivered to the sink.
    Completed(TradeItem),
    /// The relay rejected the submitted item. Nothing was traded.
    Rejected,
}

/// Run one Wonder Trade to completion.
///
/// Connects, submits `item`, and waits for a match however long that
/// takes. The received item goes to `sink` before the connection is
/// closed, so an application crash after delivery leaves no trade half
/// done on this side.
pub async fn run(
    url: &str,
    config: &ClientConfig,
    item: TradeItem,
    sink: &dyn ItemSink,
) -> Result<WonderOutcome, ClientError> {
    let mut conn = Connection::open(url, config).await?;
    conn.send(&ClientEvent::DeclareMode {
        mode: TradeMode::Wonder,
    })
    .await?;
    conn.send(&ClientEvent::SubmitItem { item }).await?;
    info!("queued for wonder trade");

    loop {
        match conn.next_event().await? {
            ServerEvent::Message { item } => {
                sink.deliver(item.clone()).await.map_err(ClientError::Sink)?;
                conn.close().await;
                info!("wonder trade completed");
                return Ok(WonderOutcome::Completed(item));
            }
            ServerEvent::InvalidPokemon => {
                conn.close().await;
                info!("wonder trade item rejected");
                return Ok(WonderOutcome::Rejected);
            }
            other => {
                debug!(event = ?other, "ignoring event while waiting for match");
            }
        }
    }
}
