//! Event type definitions for the mint pipeline.
//!
//! Events are immutable once created and flow in one direction only:
//! listener → notification channel → dispatcher.

use alloy_primitives::U256;
use std::fmt;

/// A newly minted item, ready to be announced.
///
/// Produced by the `MintListener` after the recipient's display name has
/// been resolved; consumed exactly once by the `NotificationDispatcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEvent {
    /// Reverse-resolved name of the recipient, or its truncated address.
    pub recipient: String,
    /// The minted token id.
    pub token_id: U256,
    /// Block the mint was observed in.
    pub block_number: u64,
}

/// Identifier of one output chat channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestinationId(pub u64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DestinationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The rendered message for one `MintEvent`.
///
/// Rendered once and shared by every destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub token_id: U256,
    pub text: String,
}
