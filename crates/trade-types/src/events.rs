//! Wire events exchanged between clients and the relay.
//!
//! Every frame on the socket is one JSON object tagged with an `event`
//! field. Item payloads pass through untouched; `tradeOffer` carries
//! `null` when the friend withdrew their offer.

use serde::{Deserialize, Serialize};

use crate::{FriendCode, TradeItem, TradeMode};

/// Events a client sends to the relay.
///
/// Disconnection has no event of its own; it is the transport closing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Declare which matching mode this connection wants.
    DeclareMode {
        /// Requested mode.
        mode: TradeMode,
    },
    /// Offer an item to the anonymous pool (Wonder mode).
    SubmitItem {
        /// The item to give away.
        item: TradeItem,
    },
    /// Request a fresh rendezvous code (Friend mode).
    CreateCode,
    /// Join the session of whoever holds this code (Friend mode).
    CheckCode {
        /// Code received out-of-band from the friend. Kept as a raw
        /// string so the relay can answer malformed input gracefully.
        code: String,
    },
    /// Offer an item to the friend, or withdraw the current offer.
    SetOffer {
        /// `None` cancels any standing offer.
        item: Option<TradeItem>,
    },
    /// Commit to the friend's currently offered item.
    SetAccepted,
    /// Withdraw a previous acceptance.
    CancelAccepted,
    /// Restart the negotiation sub-cycle with the same partner.
    TradeAgain,
}

/// Events the relay pushes to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Wonder Trade finalize delivery: the partner's item.
    Message {
        /// Item received from the anonymous partner.
        item: TradeItem,
    },
    /// Answer to `createCode`: the reserved rendezvous code.
    CreateCode {
        /// The code to hand to the friend out-of-band.
        code: FriendCode,
    },
    /// The session pair is established.
    FriendFound,
    /// No unmatched session holds the submitted code.
    FriendNotFound,
    /// The partner's connection went away.
    PartnerDisconnected,
    /// The friend's current offer (or its withdrawal).
    TradeOffer {
        /// `None` means the friend cancelled their offer.
        item: Option<TradeItem>,
    },
    /// Friend Trade finalize: both sides accepted; carries the item
    /// received from the friend (`None` when the friend had withdrawn
    /// their offer by the time both acceptances lined up).
    AcceptedTrade {
        /// Item received from the friend.
        item: Option<TradeItem>,
    },
    /// The submitted item failed the structural checksum.
    InvalidPokemon,
}
