//! Validated runtime configuration.

use alloy_primitives::Address;
use mintbell_core::config::{DispatcherConfig, ListenerConfig};
use std::time::Duration;
use url::Url;

/// Everything the bot needs to start, after validation.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub chain: ChainEndpoints,
    pub discord: DiscordSettings,
    /// Root of the metadata service, always ending in `/`.
    pub metadata_base_url: Url,
    pub listener: ListenerConfig,
    pub dispatcher: DispatcherConfig,
}

#[derive(Debug, Clone)]
pub struct ChainEndpoints {
    pub rpc_url: Url,
    pub ws_url: Url,
    pub ens_rpc_url: Url,
    pub ens_registry: Address,
    pub subscribe_timeout: Duration,
}

#[derive(Clone)]
pub struct DiscordSettings {
    pub token: String,
    pub reconnect_backoff: Duration,
}

impl std::fmt::Debug for DiscordSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSettings")
            .field("token", &"<redacted>")
            .field("reconnect_backoff", &self.reconnect_backoff)
            .finish()
    }
}
