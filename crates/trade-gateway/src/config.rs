//! Gateway configuration with validation and environment overrides.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use trade_relay::RelayConfig;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8082";

/// Default maximum inbound frame size (64 KiB). Trade items are small;
/// anything bigger is garbage or abuse.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default idle timeout before a silent connection is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: SocketAddr,
    /// Maximum inbound frame size in bytes.
    pub max_message_size: usize,
    /// Disconnect a connection that sends nothing for this long.
    pub idle_timeout: Duration,
    /// Relay core configuration.
    pub relay: RelayConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            // Constant is a valid socket address.
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap_or_else(|_| {
                SocketAddr::from(([0, 0, 0, 0], 8082))
            }),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            relay: RelayConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Apply `TRADE_*` environment overrides on top of the defaults.
    ///
    /// Unparseable values are reported, not silently skipped.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("TRADE_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(addr))?;
        }
        if let Ok(size) = std::env::var("TRADE_MAX_MESSAGE_SIZE") {
            config.max_message_size = size
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("TRADE_MAX_MESSAGE_SIZE", size))?;
        }
        if let Ok(secs) = std::env::var("TRADE_IDLE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("TRADE_IDLE_TIMEOUT_SECS", secs))?;
            config.idle_timeout = Duration::from_secs(secs);
        }
        if let Ok(ms) = std::env::var("TRADE_TICK_INTERVAL_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("TRADE_TICK_INTERVAL_MS", ms))?;
            config.relay.tick_interval = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size == 0 {
            return Err(ConfigError::InvalidMaxMessageSize);
        }
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::InvalidIdleTimeout);
        }
        self.relay.validate()?;
        Ok(())
    }
}

/// Gateway configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Bind address did not parse.
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
    /// A numeric environment variable did not parse.
    #[error("invalid value for {0}: {1}")]
    InvalidNumber(&'static str, String),
    /// Maximum message size must be positive.
    #[error("max_message_size cannot be zero")]
    InvalidMaxMessageSize,
    /// Idle timeout must be positive.
    #[error("idle_timeout cannot be zero")]
    InvalidIdleTimeout,
    /// Relay configuration is invalid.
    #[error(transparent)]
    Relay(#[from] trade_relay::ConfigError),
}
