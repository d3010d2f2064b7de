//! TOML file configuration structures.
//!
//! These structs directly map to the `mintbell.toml` file format.

use alloy_primitives::Address;
use mintbell_core::announce::template::DEFAULT_MESSAGE_FORMAT;
use mintbell_core::config::SubscriptionStrategy;
use serde::Deserialize;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub blockchain: BlockchainConfig,
    pub discord: DiscordConfig,
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Blockchain section.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainConfig {
    /// HTTP JSON-RPC endpoint.
    pub rpc_url: Url,
    /// WebSocket JSON-RPC endpoint used for `eth_subscribe`.
    pub ws_url: Url,
    /// Endpoint for ENS lookups; defaults to `rpc_url`.
    #[serde(default)]
    pub ens_rpc_url: Option<Url>,
    #[serde(default)]
    pub ens_registry: Option<Address>,
    /// The ERC-721 contract to watch.
    pub contract: Address,
    #[serde(default = "default_lookback_blocks")]
    pub lookback_blocks: u64,
    #[serde(default)]
    pub strategy: SubscriptionStrategy,
    #[serde(default = "default_backoff_secs")]
    pub reconnect_backoff_secs: u64,
    #[serde(default = "default_liveness_interval_secs")]
    pub liveness_interval_secs: u64,
    #[serde(default = "default_subscribe_timeout_secs")]
    pub subscribe_timeout_secs: u64,
    #[serde(default = "default_fallback_after_failures")]
    pub fallback_after_failures: u32,
    #[serde(default = "default_fallback_poll_cycles")]
    pub fallback_poll_cycles: u32,
    #[serde(default = "default_poll_range")]
    pub poll_range: u64,
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_poll_secs")]
    pub poll_backoff_secs: u64,
}

/// Discord section.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. May instead come from `MINTBELL_DISCORD_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    /// Channel ids announcements are posted to.
    pub channels: Vec<u64>,
    #[serde(default = "default_message_format")]
    pub message_format: String,
    #[serde(default = "default_backoff_secs")]
    pub reconnect_backoff_secs: u64,
}

/// Metadata service section.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Documents are read from `{base_url}/data/{id:0000}.json`.
    pub base_url: Url,
    /// Template for the item page, e.g. `https://example.com/items/{id}`.
    pub item_url: String,
    #[serde(default = "default_metadata_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: default_dedup_capacity(),
        }
    }
}

fn default_lookback_blocks() -> u64 {
    100
}

fn default_backoff_secs() -> u64 {
    5
}

fn default_liveness_interval_secs() -> u64 {
    5
}

fn default_subscribe_timeout_secs() -> u64 {
    10
}

fn default_fallback_after_failures() -> u32 {
    3
}

fn default_fallback_poll_cycles() -> u32 {
    20
}

fn default_poll_range() -> u64 {
    10_000
}

fn default_poll_secs() -> u64 {
    15
}

fn default_message_format() -> String {
    DEFAULT_MESSAGE_FORMAT.to_string()
}

fn default_metadata_timeout_secs() -> u64 {
    10
}

fn default_dedup_capacity() -> usize {
    10
}
