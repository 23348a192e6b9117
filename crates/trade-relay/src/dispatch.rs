//! Per-connection dispatch loop.
//!
//! Every live connection has one loop task observing shared state and
//! delivering the events it implies. The loop sleeps on the connection's
//! waker with the tick interval as a fallback heartbeat, so a wakeup
//! that is lost or never signalled costs at most one interval of
//! latency.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, trace};
use trade_types::{ConnectionId, ServerEvent, TradeMode};

use crate::friend::FriendTradeStore;
use crate::registry::ConnectionRegistry;
use crate::wonder::WonderTradePool;

/// Run the dispatch loop for one connection until it is deregistered.
pub(crate) async fn run(
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    pool: Arc<WonderTradePool>,
    friends: Arc<FriendTradeStore>,
    wake: Arc<Notify>,
    tick_interval: Duration,
) {
    // A Wonder result stays in the pool until disconnect; remember a
    // successful queue-up so redelivery only happens if queueing failed.
    let mut wonder_delivered = false;

    loop {
        let Some(mode) = registry.mode(id) else {
            break;
        };

        let event = match mode {
            TradeMode::None => None,
            TradeMode::Wonder => {
                if wonder_delivered {
                    None
                } else {
                    pool.poll(id).map(|item| ServerEvent::Message { item })
                }
            }
            TradeMode::Friend => friends.tick(id),
        };

        if let Some(event) = event {
            let is_wonder_result = matches!(event, ServerEvent::Message { .. });
            if registry.send(id, event).is_ok() && is_wonder_result {
                wonder_delivered = true;
            }
        }

        trace!(connection = %id, "dispatch cycle complete");
        tokio::select! {
            _ = wake.notified() => {}
            _ = sleep(tick_interval) => {}
        }
    }

    debug!(connection = %id, "dispatch loop terminated");
}
