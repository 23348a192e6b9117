//! # Trade Relay Core
//!
//! In-memory matchmaking relay letting two clients that do not trust each
//! other exchange one trade item apiece. Two matching modes exist:
//!
//! - **Wonder Trade**: anonymous pooled matching, where any two waiting
//!   connections are paired automatically.
//! - **Friend Trade**: code-paired matching, where two specific connections
//!   rendezvous via a short shared code, then negotiate offers and confirm
//!   before the exchange is finalized.
//!
//! ## Friend Trade state machine
//!
//! ```text
//! [Initial] ──checkCode match──→ [Connected] ──tick──→ [Notified]
//!                                                          │  ↑
//!                                  offers / acceptances    │  │ tradeAgain
//!                                                          ↓  │
//!                                   [Ending] ←──tick── [Accepted]
//! ```
//!
//! All state lives in this process and is lost on restart; the relay
//! deliberately persists nothing.
//!
//! ## Delivery model
//!
//! Every relay→client event is delivered by that connection's dispatch
//! loop observing shared state, never by push-on-write. One inspection
//! cycle runs per loop wakeup; store mutations signal the affected
//! connections so delivery usually beats the fallback tick interval, and
//! latency is bounded by one interval either way.
//!
//! ## Concurrency
//!
//! The Wonder pool, the Friend session store, and the code reservation set
//! each sit behind a single mutex so that every multi-entry update (pool
//! pairing, session-pair connection) is one atomic step. The connection
//! registry only ever needs per-entry access and uses a concurrent map.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod codes;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod friend;
pub mod ports;
pub mod registry;
pub mod relay;
pub mod wonder;

pub use codes::CodeGenerator;
pub use config::{ConfigError, RelayConfig};
pub use error::RelayError;
pub use friend::{CheckCodeOutcome, FriendTradeState, FriendTradeStore};
pub use ports::{AcceptAllValidator, ChecksumValidator, ItemValidator};
pub use registry::ConnectionRegistry;
pub use relay::Relay;
pub use wonder::{SubmitOutcome, WonderTradePool};
