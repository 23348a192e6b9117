//! Relay facade: connection lifecycle and inbound event handling.
//!
//! The facade owns the registry, both mode stores, and the validator. All
//! inbound client events funnel through [`Relay::handle_event`]; every
//! store mutation wakes the dispatch loops of the connections it may
//! concern. Immediate request/response answers (`createCode`,
//! `friendNotFound`, `invalidPokemon`) are queued directly rather than
//! waiting for a dispatch cycle.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use trade_types::{ClientEvent, ConnectionId, FriendCode, ServerEvent, TradeItem, TradeMode};

use crate::config::RelayConfig;
use crate::dispatch;
use crate::error::{RelayError, RelayResult};
use crate::friend::{CheckCodeOutcome, FriendTradeStore};
use crate::ports::{ChecksumValidator, ItemValidator};
use crate::registry::ConnectionRegistry;
use crate::wonder::{SubmitOutcome, WonderTradePool};

struct RelayInner {
    config: RelayConfig,
    registry: Arc<ConnectionRegistry>,
    pool: Arc<WonderTradePool>,
    friends: Arc<FriendTradeStore>,
    validator: Arc<dyn ItemValidator>,
}

/// The matchmaking relay. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Relay {
    inner: Arc<RelayInner>,
}

impl Relay {
    /// Create a relay with the default structural checksum validator.
    pub fn new(config: RelayConfig) -> Self {
        Self::with_validator(config, Arc::new(ChecksumValidator))
    }

    /// Create a relay with a custom item validator.
    pub fn with_validator(config: RelayConfig, validator: Arc<dyn ItemValidator>) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                config,
                registry: Arc::new(ConnectionRegistry::new()),
                pool: Arc::new(WonderTradePool::new()),
                friends: Arc::new(FriendTradeStore::default()),
                validator,
            }),
        }
    }

    /// Admit a new connection and spawn its dispatch loop.
    ///
    /// Events for the connection arrive on `outbox`; the caller is the
    /// transport layer draining that queue into the socket.
    pub fn connect(&self, outbox: mpsc::Sender<ServerEvent>) -> ConnectionId {
        let id = ConnectionId::new();
        let wake = self.inner.registry.register(id, outbox);
        tokio::spawn(dispatch::run(
            id,
            Arc::clone(&self.inner.registry),
            Arc::clone(&self.inner.pool),
            Arc::clone(&self.inner.friends),
            wake,
            self.inner.config.tick_interval,
        ));
        info!(connection = %id, live = self.inner.registry.len(), "connection admitted");
        id
    }

    /// Tear down a connection: its pool entry, its session (releasing the
    /// code), and its registry record, in that order. A Friend peer is
    /// woken so it detects the departure within one cycle. Disconnecting
    /// an unknown connection is a logged no-op.
    pub fn disconnect(&self, id: ConnectionId) {
        if let Some(peer) = self.inner.friends.disconnect(id) {
            self.inner.registry.wake(peer);
        }
        self.inner.pool.remove(id);
        match self.inner.registry.deregister(id) {
            Ok(()) => {
                info!(connection = %id, live = self.inner.registry.len(), "connection closed")
            }
            Err(e) => warn!(connection = %id, error = %e, "disconnect of unknown connection"),
        }
    }

    /// Handle one inbound client event.
    ///
    /// Protocol-level rejections (`friendNotFound`, `invalidPokemon`) are
    /// answered to the submitter before the error is returned; callers
    /// only need to log it. No failure here affects any other connection.
    pub fn handle_event(&self, id: ConnectionId, event: ClientEvent) -> RelayResult<()> {
        match event {
            ClientEvent::DeclareMode { mode } => {
                debug!(connection = %id, %mode, "mode declared");
                self.inner.registry.set_mode(id, mode)
            }
            ClientEvent::SubmitItem { item } => {
                self.require_mode(id, TradeMode::Wonder)?;
                self.submit_item(id, item)
            }
            ClientEvent::CreateCode => {
                self.require_mode(id, TradeMode::Friend)?;
                let code = self.inner.friends.create_code(id);
                self.inner.registry.send(id, ServerEvent::CreateCode { code })
            }
            ClientEvent::CheckCode { code } => {
                self.require_mode(id, TradeMode::Friend)?;
                self.check_code(id, &code)
            }
            ClientEvent::SetOffer { item } => {
                self.require_mode(id, TradeMode::Friend)?;
                self.set_offer(id, item)
            }
            ClientEvent::SetAccepted => {
                self.require_mode(id, TradeMode::Friend)?;
                self.inner.friends.set_accepted(id, true)?;
                self.wake_pair(id);
                Ok(())
            }
            ClientEvent::CancelAccepted => {
                self.require_mode(id, TradeMode::Friend)?;
                self.inner.friends.set_accepted(id, false)?;
                self.wake_pair(id);
                Ok(())
            }
            ClientEvent::TradeAgain => {
                self.require_mode(id, TradeMode::Friend)?;
                self.inner.friends.trade_again(id)?;
                self.wake_pair(id);
                Ok(())
            }
        }
    }

    fn submit_item(&self, id: ConnectionId, item: TradeItem) -> RelayResult<()> {
        if !self.inner.validator.validate(&item) {
            debug!(connection = %id, "wonder trade item rejected");
            self.inner.registry.send(id, ServerEvent::InvalidPokemon)?;
            return Err(RelayError::InvalidItem);
        }
        match self.inner.pool.submit(id, item) {
            SubmitOutcome::Paired(partner) => {
                self.inner.registry.wake(partner);
                self.inner.registry.wake(id);
            }
            SubmitOutcome::Queued | SubmitOutcome::AlreadyEntered => {}
        }
        Ok(())
    }

    fn check_code(&self, id: ConnectionId, raw: &str) -> RelayResult<()> {
        let code = match FriendCode::parse(raw) {
            Ok(code) => code,
            Err(e) => {
                debug!(connection = %id, error = %e, "rejected friend code");
                self.inner.registry.send(id, ServerEvent::FriendNotFound)?;
                return Err(e.into());
            }
        };
        match self.inner.friends.check_code(id, &code) {
            CheckCodeOutcome::Matched(partner) => {
                self.inner.registry.wake(partner);
                self.inner.registry.wake(id);
                Ok(())
            }
            CheckCodeOutcome::NotFound => {
                self.inner.registry.send(id, ServerEvent::FriendNotFound)
            }
        }
    }

    fn set_offer(&self, id: ConnectionId, item: Option<TradeItem>) -> RelayResult<()> {
        if let Some(item) = &item {
            if !self.inner.validator.validate(item) {
                debug!(connection = %id, "friend trade offer rejected");
                self.inner.registry.send(id, ServerEvent::InvalidPokemon)?;
                return Err(RelayError::InvalidItem);
            }
        }
        self.inner.friends.set_offer(id, item)?;
        self.wake_pair(id);
        Ok(())
    }

    fn require_mode(&self, id: ConnectionId, mode: TradeMode) -> RelayResult<()> {
        match self.inner.registry.mode(id) {
            Some(m) if m == mode => Ok(()),
            Some(_) => Err(RelayError::WrongMode(id, mode)),
            None => Err(RelayError::UnknownConnection(id)),
        }
    }

    /// Wake a connection and its Friend partner, if any.
    fn wake_pair(&self, id: ConnectionId) {
        self.inner.registry.wake(id);
        if let Some(peer) = self.inner.friends.friend_of(id) {
            self.inner.registry.wake(peer);
        }
    }

    /// The connection registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    /// The Wonder Trade pool.
    pub fn pool(&self) -> &WonderTradePool {
        &self.inner.pool
    }

    /// The Friend Trade session store.
    pub fn friends(&self) -> &FriendTradeStore {
        &self.inner.friends
    }

    /// The configuration the relay was built with.
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }
}
