//! Relay error taxonomy.
//!
//! Failures are local to the connection that caused them: transport
//! errors tear down one connection, protocol errors are answered to the
//! requester only, and invariant violations are logged and swallowed.

use trade_types::{CodeError, ConnectionId, TradeMode};

/// Errors surfaced by relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Operation referenced a connection the registry does not know.
    /// Logged and treated as a no-op; never propagated to any client.
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// Operation requires a mode the connection has not declared.
    #[error("connection {0} has not declared {1} mode")]
    WrongMode(ConnectionId, TradeMode),

    /// Submitted friend code was blank or malformed.
    #[error(transparent)]
    Code(#[from] CodeError),

    /// Connection has no Friend Trade session.
    #[error("no friend trade session for connection {0}")]
    NoSession(ConnectionId),

    /// Item failed the structural checksum. Reported to the submitter as
    /// a cancellation-equivalent event; the offer is discarded.
    #[error("item failed structural checksum")]
    InvalidItem,

    /// Outbound event queue for a connection is gone or full.
    #[error("failed to queue event for connection {0}")]
    Outbox(ConnectionId),
}

/// Result alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
