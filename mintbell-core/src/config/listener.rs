//! Listener configuration.

use alloy_primitives::Address;
use serde::Deserialize;
use std::time::Duration;

/// How the listener obtains logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStrategy {
    /// Push subscription, falling back to polling on persistent failure.
    #[default]
    Streaming,
    /// `eth_getLogs` polling only.
    Polling,
}

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// The ERC-721 contract to watch.
    pub contract: Address,
    /// Blocks before the head to scan on every (re)connect.
    pub lookback_blocks: u64,
    pub strategy: SubscriptionStrategy,
    /// Fixed delay between streaming attempts.
    pub reconnect_backoff: Duration,
    /// How often a subscribed feed is checked for liveness.
    pub liveness_interval: Duration,
    /// Consecutive streaming failures before switching to polling.
    /// `0` never switches.
    pub fallback_after_failures: u32,
    /// Polling rounds to run before trying streaming again.
    pub fallback_poll_cycles: u32,
    /// Maximum block span of one `eth_getLogs` request.
    pub poll_range: u64,
    /// Delay between polling rounds.
    pub poll_interval: Duration,
    /// Delay after a failed poll.
    pub poll_backoff: Duration,
}

impl ListenerConfig {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            lookback_blocks: 100,
            strategy: SubscriptionStrategy::Streaming,
            reconnect_backoff: Duration::from_secs(5),
            liveness_interval: Duration::from_secs(5),
            fallback_after_failures: 3,
            fallback_poll_cycles: 20,
            poll_range: 10_000,
            poll_interval: Duration::from_secs(15),
            poll_backoff: Duration::from_secs(15),
        }
    }
}
