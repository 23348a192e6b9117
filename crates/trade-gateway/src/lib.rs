//! # Trade Gateway
//!
//! WebSocket front door for the trade relay. Each socket maps to exactly
//! one relay connection: frames in become client events, queued relay
//! events become frames out, and the socket closing (or going idle) tears
//! the relay connection down.

pub mod config;
pub mod ws;

pub use config::{ConfigError, GatewayConfig};
pub use ws::router;
