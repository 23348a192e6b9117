//! WebSocket plumbing shared by both controllers.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use trade_types::{ClientEvent, ServerEvent};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// One live connection to the relay.
pub struct Connection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection {
    /// Open a connection, bounded by the configured handshake timeout.
    pub async fn open(url: &str, config: &ClientConfig) -> Result<Self, ClientError> {
        let (stream, _) = timeout(config.connect_timeout, connect_async(url))
            .await
            .map_err(|_| ClientError::ConnectTimeout)??;
        debug!(%url, "connected to relay");
        Ok(Self { stream })
    }

    /// Send one client event.
    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        let text = serde_json::to_string(event)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Wait for the next server event, skipping protocol-level frames.
    pub async fn next_event(&mut self) -> Result<ServerEvent, ClientError> {
        loop {
            let frame = self
                .stream
                .next()
                .await
                .ok_or(ClientError::ConnectionClosed)??;
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_ref())
                        .map_err(|e| ClientError::Protocol(e.to_string()));
                }
                Message::Close(_) => return Err(ClientError::ConnectionClosed),
                // Pings are answered by the protocol layer.
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Binary(_) | Message::Frame(_) => {
                    warn!("ignoring unexpected frame type from relay");
                }
            }
        }
    }

    /// Close the connection cleanly. Failures do not matter at this
    /// point; the relay cleans up on socket teardown either way.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
