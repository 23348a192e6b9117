//! Client error taxonomy.

/// Errors surfaced by the trade controllers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The WebSocket handshake did not complete in time.
    #[error("connection attempt timed out")]
    ConnectTimeout,

    /// Underlying WebSocket failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The relay closed the connection mid-session.
    #[error("connection closed by the relay")]
    ConnectionClosed,

    /// A frame from the relay did not parse as a server event.
    #[error("unparseable frame from relay: {0}")]
    Protocol(String),

    /// No unmatched session holds the submitted code.
    #[error("no friend holds this code")]
    FriendNotFound,

    /// Delivering a received item to the application failed.
    #[error("item sink failed: {0}")]
    Sink(#[source] anyhow::Error),
}
