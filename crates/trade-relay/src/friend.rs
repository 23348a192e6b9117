//! Friend Trade session store and negotiation state machine.
//!
//! Each participant owns one session; two sessions sharing a code and
//! pointing at each other's connection id form the session pair. All
//! transitions are defined on the pair, but each session is stored and
//! advanced independently: the two `state` fields may drift for at most
//! one dispatch cycle, which the next cycle resolves.
//!
//! Progression: `Initial → Connected → Notified → Accepted → Ending`,
//! with `tradeAgain` re-entering `Notified` for another round on the
//! same code.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};
use trade_types::{ConnectionId, FriendCode, ServerEvent, TradeItem};

use crate::codes::CodeGenerator;
use crate::error::{RelayError, RelayResult};

/// Where a session is in the negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendTradeState {
    /// Code created, nobody has joined yet.
    Initial,
    /// Pair established; the owner has not been told yet.
    Connected,
    /// Owner knows about the pair; offers and acceptances flow here.
    Notified,
    /// Both sides accepted; finalize signal pending.
    Accepted,
    /// Finalize signal delivered; round complete.
    Ending,
}

/// One connection's view of an in-progress Friend Trade.
#[derive(Debug, Clone)]
struct FriendSession {
    code: FriendCode,
    friend: Option<ConnectionId>,
    state: FriendTradeState,
    /// Standing offer. `offered_item == None` with `has_offer == true`
    /// means the owner explicitly withdrew an earlier offer, which the
    /// friend still has to be told about.
    offered_item: Option<TradeItem>,
    has_offer: bool,
    friend_was_notified_of_offer: bool,
    accepted_trade: bool,
    /// The friend's item, captured when the pair reached `Accepted`.
    friend_item: Option<TradeItem>,
}

impl FriendSession {
    fn new(code: FriendCode) -> Self {
        Self {
            code,
            friend: None,
            state: FriendTradeState::Initial,
            offered_item: None,
            has_offer: false,
            friend_was_notified_of_offer: false,
            accepted_trade: false,
            friend_item: None,
        }
    }
}

/// Outcome of submitting a code to join a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCodeOutcome {
    /// Joined; both sessions are now `Connected` to each other.
    Matched(ConnectionId),
    /// No unmatched session holds this code.
    NotFound,
}

/// Holds per-code negotiation state for paired connections.
#[derive(Debug)]
pub struct FriendTradeStore {
    sessions: Mutex<HashMap<ConnectionId, FriendSession>>,
    codes: Arc<CodeGenerator>,
}

impl Default for FriendTradeStore {
    fn default() -> Self {
        Self::new(Arc::new(CodeGenerator::new()))
    }
}

impl FriendTradeStore {
    /// Create a store issuing codes from the given generator.
    pub fn new(codes: Arc<CodeGenerator>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            codes,
        }
    }

    /// The code generator backing this store.
    pub fn codes(&self) -> &CodeGenerator {
        &self.codes
    }

    /// Create and reserve a fresh code for a connection, opening its
    /// session. A connection that already had a session abandons it
    /// (its previous code is released).
    pub fn create_code(&self, id: ConnectionId) -> FriendCode {
        let mut sessions = self.sessions.lock();
        if let Some(old) = sessions.remove(&id) {
            self.codes.release(&old.code);
        }
        let code = self.codes.generate();
        sessions.insert(id, FriendSession::new(code.clone()));
        info!(connection = %id, %code, "friend code created");
        code
    }

    /// Try to join the session holding `code`.
    ///
    /// On success both sessions move to `Connected` and point at each
    /// other, in one locked step. On failure nothing is created or
    /// mutated. A connection cannot match a code it holds itself.
    pub fn check_code(&self, id: ConnectionId, code: &FriendCode) -> CheckCodeOutcome {
        let mut sessions = self.sessions.lock();

        let partner = sessions
            .iter()
            .find(|(other, session)| {
                **other != id && session.friend.is_none() && session.code == *code
            })
            .map(|(other, _)| *other);

        let Some(partner_id) = partner else {
            debug!(connection = %id, %code, "no partner holds this code");
            return CheckCodeOutcome::NotFound;
        };

        if let Some(old) = sessions.remove(&id) {
            self.codes.release(&old.code);
        }

        if let Some(partner_session) = sessions.get_mut(&partner_id) {
            partner_session.friend = Some(id);
            partner_session.state = FriendTradeState::Connected;
        }
        let mut session = FriendSession::new(code.clone());
        session.friend = Some(partner_id);
        session.state = FriendTradeState::Connected;
        sessions.insert(id, session);

        info!(connection = %id, partner = %partner_id, %code, "friend trade matched");
        CheckCodeOutcome::Matched(partner_id)
    }

    /// Set or withdraw the caller's offer.
    ///
    /// A new offer always requires re-notification of the friend and
    /// invalidates the caller's pending acceptance: acceptance is a
    /// commitment to the item offered at the time.
    pub fn set_offer(&self, id: ConnectionId, item: Option<TradeItem>) -> RelayResult<()> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(&id).ok_or(RelayError::NoSession(id))?;
        session.offered_item = item;
        session.has_offer = true;
        session.friend_was_notified_of_offer = false;
        session.accepted_trade = false;
        Ok(())
    }

    /// Toggle the caller's acceptance flag. State only advances when the
    /// dispatch cycle observes both sides accepting simultaneously.
    pub fn set_accepted(&self, id: ConnectionId, accepted: bool) -> RelayResult<()> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(&id).ok_or(RelayError::NoSession(id))?;
        session.accepted_trade = accepted;
        Ok(())
    }

    /// Restart the negotiation sub-cycle with the same partner and code.
    pub fn trade_again(&self, id: ConnectionId) -> RelayResult<()> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(&id).ok_or(RelayError::NoSession(id))?;
        session.state = FriendTradeState::Notified;
        session.offered_item = None;
        session.has_offer = false;
        session.friend_was_notified_of_offer = false;
        session.accepted_trade = false;
        session.friend_item = None;
        info!(connection = %id, "trading again");
        Ok(())
    }

    /// One dispatch inspection cycle for a connection's session.
    ///
    /// Returns the event to deliver, if this cycle produced one. Sessions
    /// without a partner have nothing to report.
    pub fn tick(&self, id: ConnectionId) -> Option<ServerEvent> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get(&id)?;
        session.friend?;

        match session.state {
            FriendTradeState::Initial | FriendTradeState::Ending => None,
            FriendTradeState::Connected => {
                if let Some(session) = sessions.get_mut(&id) {
                    session.state = FriendTradeState::Notified;
                }
                debug!(connection = %id, "notified of friend connection");
                Some(ServerEvent::FriendFound)
            }
            FriendTradeState::Notified => self.tick_notified(&mut sessions, id),
            FriendTradeState::Accepted => {
                let session = sessions.get_mut(&id)?;
                session.state = FriendTradeState::Ending;
                let item = session.friend_item.clone();
                info!(connection = %id, "friend trade finalized");
                Some(ServerEvent::AcceptedTrade { item })
            }
        }
    }

    /// `Notified` handling: detect an orphaned pair, forward a pending
    /// offer, or promote a simultaneous double-acceptance.
    fn tick_notified(
        &self,
        sessions: &mut HashMap<ConnectionId, FriendSession>,
        id: ConnectionId,
    ) -> Option<ServerEvent> {
        let session = sessions.get(&id)?;

        // The peer releases the shared code when it departs; an orphaned
        // session detects that here.
        if !self.codes.is_reserved(&session.code) {
            debug!(connection = %id, "partner released the code");
            return Some(ServerEvent::PartnerDisconnected);
        }

        let friend_id = session.friend?;
        let accepted = session.accepted_trade;
        let friend = sessions.get(&friend_id)?;

        if friend.has_offer && !friend.friend_was_notified_of_offer {
            let offer = friend.offered_item.clone();
            if let Some(friend) = sessions.get_mut(&friend_id) {
                friend.friend_was_notified_of_offer = true;
            }
            debug!(
                connection = %id,
                cancelled = offer.is_none(),
                "forwarding trade offer"
            );
            return Some(ServerEvent::TradeOffer { item: offer });
        }

        if accepted && friend.accepted_trade {
            // Promote the whole pair in one step; each side captures the
            // other's item before either can mutate it further.
            let friend_offer = friend.offered_item.clone();
            let own_offer = sessions.get(&id).and_then(|s| s.offered_item.clone());
            if let Some(session) = sessions.get_mut(&id) {
                session.state = FriendTradeState::Accepted;
                session.friend_item = friend_offer;
            }
            if let Some(friend) = sessions.get_mut(&friend_id) {
                friend.state = FriendTradeState::Accepted;
                friend.friend_item = own_offer;
            }
            debug!(connection = %id, friend = %friend_id, "both sides accepted");
        }

        None
    }

    /// Tear down a connection's session, releasing the code reservation.
    ///
    /// Any peer session referencing the code self-detects the departure
    /// on its next cycle via the code-reservation check. Returns the
    /// peer's id so its dispatch loop can be woken.
    pub fn disconnect(&self, id: ConnectionId) -> Option<ConnectionId> {
        let mut sessions = self.sessions.lock();
        let session = sessions.remove(&id)?;
        self.codes.release(&session.code);
        info!(connection = %id, code = %session.code, "friend trade session closed");
        session.friend
    }

    /// Whether a connection has a session.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.lock().contains_key(&id)
    }

    /// Current state of a connection's session.
    pub fn state_of(&self, id: ConnectionId) -> Option<FriendTradeState> {
        self.sessions.lock().get(&id).map(|s| s.state)
    }

    /// Acceptance flag of a connection's session.
    pub fn accepted_of(&self, id: ConnectionId) -> Option<bool> {
        self.sessions.lock().get(&id).map(|s| s.accepted_trade)
    }

    /// Partner of a connection's session, once matched.
    pub fn friend_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.sessions.lock().get(&id).and_then(|s| s.friend)
    }

    /// Standing offer of a connection's session.
    pub fn offer_of(&self, id: ConnectionId) -> Option<Option<TradeItem>> {
        let sessions = self.sessions.lock();
        let session = sessions.get(&id)?;
        session.has_offer.then(|| session.offered_item.clone())
    }
}
