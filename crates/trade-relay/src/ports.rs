//! Validation seam for submitted items.
//!
//! The relay never interprets item payloads; validation is structural
//! only and pluggable so deployments can tighten or loosen it.

use trade_types::TradeItem;

/// Structural validation of items entering the relay.
///
/// A rejected item never enters any pool or session; the submitter is
/// told and nothing else changes.
pub trait ItemValidator: Send + Sync {
    /// Whether the item may enter the relay.
    fn validate(&self, item: &TradeItem) -> bool;
}

/// Requires the item's checksum to match its payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumValidator;

impl ItemValidator for ChecksumValidator {
    fn validate(&self, item: &TradeItem) -> bool {
        item.checksum_ok()
    }
}

/// Accepts everything. Useful for tests and trusted deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl ItemValidator for AcceptAllValidator {
    fn validate(&self, _item: &TradeItem) -> bool {
        true
    }
}
