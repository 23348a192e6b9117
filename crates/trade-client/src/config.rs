//! Client configuration.

use std::time::Duration;

/// Default time allowed for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings shared by both trade controllers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Abort the connection attempt after this long.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}
