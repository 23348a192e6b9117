//! # Trade Types
//!
//! Protocol vocabulary shared by the relay core, the WebSocket gateway,
//! and the client session controller.
//!
//! The relay never looks inside a [`TradeItem`] payload beyond existence
//! and checksum; the payload belongs to the storage subsystem on either
//! end of a trade.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod events;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use events::{ClientEvent, ServerEvent};

/// Length of a friend code in characters.
pub const FRIEND_CODE_LENGTH: usize = 8;

/// Opaque identifier for one live client connection.
///
/// Assigned by the gateway when the socket is accepted and never reused
/// within a relay process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for log correlation.
        let s = self.0.simple().to_string();
        write!(f, "{}", &s[..8])
    }
}

/// Matching mode a connection has declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeMode {
    /// Connected but no mode declared yet.
    None,
    /// Anonymous pooled matching.
    Wonder,
    /// Code-paired negotiated matching.
    Friend,
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeMode::None => write!(f, "NONE"),
            TradeMode::Wonder => write!(f, "WONDER"),
            TradeMode::Friend => write!(f, "FRIEND"),
        }
    }
}

/// Error produced when a string does not form a valid friend code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    /// Empty code submitted.
    #[error("friend code is blank")]
    Blank,
    /// Wrong length or character set.
    #[error("malformed friend code: {0:?}")]
    Malformed(String),
}

/// An 8-character lowercase alphanumeric rendezvous code.
///
/// Globally unique among codes currently reserved by the relay; released
/// and reusable once the owning Friend Trade session ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FriendCode(String);

impl FriendCode {
    /// Validate and wrap a code received over the wire.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        if raw.is_empty() {
            return Err(CodeError::Blank);
        }
        let well_formed = raw.len() == FRIEND_CODE_LENGTH
            && raw
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !well_formed {
            return Err(CodeError::Malformed(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Wrap a string the generator already guarantees to be well-formed.
    pub(crate) fn from_generated(raw: String) -> Self {
        debug_assert_eq!(raw.len(), FRIEND_CODE_LENGTH);
        Self(raw)
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FriendCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build a [`FriendCode`] from generator output without re-validating.
///
/// Only the code generator should call this; everything arriving over the
/// wire goes through [`FriendCode::parse`].
pub fn code_from_generator(raw: String) -> FriendCode {
    FriendCode::from_generated(raw)
}

/// One tradeable data record.
///
/// The payload is opaque to the relay; `checksum` is the structural
/// validity signal computed by the originating storage subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeItem {
    /// Opaque content owned by the storage collaborators.
    pub payload: serde_json::Value,
    /// Structural checksum over the serialized payload.
    pub checksum: u32,
}

impl TradeItem {
    /// Create an item with its checksum already computed by the caller.
    pub fn new(payload: serde_json::Value, checksum: u32) -> Self {
        Self { payload, checksum }
    }

    /// Create an item with a freshly computed structural checksum.
    pub fn with_checksum(payload: serde_json::Value) -> Self {
        let checksum = payload_checksum(&payload);
        Self { payload, checksum }
    }

    /// Whether the stored checksum matches the payload.
    pub fn checksum_ok(&self) -> bool {
        self.checksum == payload_checksum(&self.payload)
    }
}

/// Structural checksum over an opaque payload.
///
/// First four bytes of the SHA-256 digest of the payload's canonical JSON
/// text, little-endian. Both storage collaborators and the relay's
/// validator compute the same value.
pub fn payload_checksum(payload: &serde_json::Value) -> u32 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    let digest = hasher.finalize();
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}
