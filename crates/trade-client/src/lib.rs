//! # Trade Client
//!
//! Client-side session controllers speaking the relay's wire protocol.
//! [`wonder::run`] drives a complete fire-and-forget Wonder Trade;
//! [`FriendTrade`] holds an interactive code-paired session open for the
//! application to drive.

pub mod config;
pub mod connection;
pub mod error;
pub mod friend;
pub mod sink;
pub mod wonder;

pub use config::ClientConfig;
pub use error::ClientError;
pub use friend::{FriendEvent, FriendTrade};
pub use sink::ItemSink;
pub use wonder::{run as run_wonder_trade, WonderOutcome};
