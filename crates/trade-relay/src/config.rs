//! Relay configuration with validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default dispatch tick interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default capacity of each connection's outbound event queue.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

/// Relay core configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Fallback heartbeat interval for each connection's dispatch loop.
    /// End-to-end latency of any state transition is bounded by one tick.
    pub tick_interval: Duration,
    /// Buffered events per connection before the sender is considered
    /// stuck and the event is dropped with a warning.
    pub outbox_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::InvalidTickInterval);
        }
        if self.outbox_capacity == 0 {
            return Err(ConfigError::InvalidOutboxCapacity);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Tick interval must be positive.
    #[error("tick_interval cannot be zero")]
    InvalidTickInterval,
    /// Outbox capacity must be positive.
    #[error("outbox_capacity cannot be zero")]
    InvalidOutboxCapacity,
}
