//! Friend Trade controller: an interactive code-paired session.
//!
//! The application drives the negotiation (offer, accept, trade again)
//! and consumes [`FriendEvent`]s from [`FriendTrade::next_event`]. The
//! controller only translates; all pairing and sequencing rules live in
//! the relay.

use tracing::{debug, info};
use trade_types::{ClientEvent, FriendCode, ServerEvent, TradeItem, TradeMode};

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::ClientError;

/// Session events surfaced to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum FriendEvent {
    /// The friend joined; negotiation may begin.
    FriendFound,
    /// The friend offered an item, or withdrew their offer.
    Offer(Option<TradeItem>),
    /// Both sides accepted; this is the item received from the friend.
    Finalized(Option<TradeItem>),
    /// The friend's connection went away. The session is over.
    PartnerDisconnected,
    /// The relay rejected the offered item. The offer was discarded.
    OfferRejected,
}

/// An open Friend Trade session.
pub struct FriendTrade {
    conn: Connection,
}

impl FriendTrade {
    /// Host a session: reserve a code to hand to the friend out-of-band.
    pub async fn host(
        url: &str,
        config: &ClientConfig,
    ) -> Result<(Self, FriendCode), ClientError> {
        let mut conn = Connection::open(url, config).await?;
        conn.send(&ClientEvent::DeclareMode {
            mode: TradeMode::Friend,
        })
        .await?;
        conn.send(&ClientEvent::CreateCode).await?;

        loop {
            match conn.next_event().await? {
                ServerEvent::CreateCode { code } => {
                    info!(%code, "hosting friend trade");
                    return Ok((Self { conn }, code));
                }
                other => debug!(event = ?other, "ignoring event while awaiting code"),
            }
        }
    }

    /// Join the session of whoever holds `code`.
    ///
    /// Fails with [`ClientError::FriendNotFound`] when no unmatched
    /// session holds the code; the connection is closed in that case.
    pub async fn join(url: &str, config: &ClientConfig, code: &str) -> Result<Self, ClientError> {
        let mut conn = Connection::open(url, config).await?;
        conn.send(&ClientEvent::DeclareMode {
            mode: TradeMode::Friend,
        })
        .await?;
        conn.send(&ClientEvent::CheckCode {
            code: code.to_owned(),
        })
        .await?;

        loop {
            match conn.next_event().await? {
                ServerEvent::FriendFound => {
                    info!(%code, "joined friend trade");
                    return Ok(Self { conn });
                }
                ServerEvent::FriendNotFound => {
                    conn.close().await;
                    return Err(ClientError::FriendNotFound);
                }
                other => debug!(event = ?other, "ignoring event while joining"),
            }
        }
    }

    /// Offer an item to the friend, or withdraw the current offer.
    pub async fn offer(&mut self, item: Option<TradeItem>) -> Result<(), ClientError> {
        self.conn.send(&ClientEvent::SetOffer { item }).await
    }

    /// Commit to the friend's currently offered item.
    pub async fn accept(&mut self) -> Result<(), ClientError> {
        self.conn.send(&ClientEvent::SetAccepted).await
    }

    /// Withdraw a previous acceptance.
    pub async fn cancel_acceptance(&mut self) -> Result<(), ClientError> {
        self.conn.send(&ClientEvent::CancelAccepted).await
    }

    /// Restart the negotiation sub-cycle with the same friend.
    pub async fn trade_again(&mut self) -> Result<(), ClientError> {
        self.conn.send(&ClientEvent::TradeAgain).await
    }

    /// Wait for the next session event.
    pub async fn next_event(&mut self) -> Result<FriendEvent, ClientError> {
        loop {
            let event = self.conn.next_event().await?;
            if let Some(event) = map_event(event) {
                return Ok(event);
            }
        }
    }

    /// Leave the session, closing the connection.
    pub async fn leave(self) {
        self.conn.close().await;
    }
}

fn map_event(event: ServerEvent) -> Option<FriendEvent> {
    match event {
        ServerEvent::FriendFound => Some(FriendEvent::FriendFound),
        ServerEvent::TradeOffer { item } => Some(FriendEvent::Offer(item)),
        ServerEvent::AcceptedTrade { item } => Some(FriendEvent::Finalized(item)),
        ServerEvent::PartnerDisconnected => Some(FriendEvent::PartnerDisconnected),
        ServerEvent::InvalidPokemon => Some(FriendEvent::OfferRejected),
        other => {
            debug!(event = ?other, "ignoring event outside the session protocol");
            None
        }
    }
}
