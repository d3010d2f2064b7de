//! Configuration module for mintbell-bot.
//!
//! Handles loading configuration from the TOML file and the token override
//! from the command line or environment.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{ChainEndpoints, DiscordSettings, LoadedConfig};
use mintbell_core::announce::MessageTemplate;
use mintbell_core::chain::ens::ENS_REGISTRY;
use mintbell_core::config::{DispatcherConfig, ListenerConfig};
use mintbell_core::events::DestinationId;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Accepted range for reconnect backoffs, in seconds.
const BACKOFF_RANGE_SECS: RangeInclusive<u64> = 2..=30;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("no Discord token in the config file or MINTBELL_DISCORD_TOKEN")]
    MissingToken,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    token_override: Option<String>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, token_override: Option<String>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            token_override,
        }
    }

    /// Read, validate and convert the configuration file.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(token) = self.token_override.clone() {
            file_config.discord.token = Some(token);
        }

        validate(&file_config)?;
        build_loaded_config(file_config)
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let chain = &config.blockchain;
    if config.discord.channels.is_empty() {
        return Err(ConfigError::ValidationError(
            "discord.channels must list at least one channel".to_string(),
        ));
    }
    check_backoff("blockchain.reconnect_backoff_secs", chain.reconnect_backoff_secs)?;
    check_backoff("discord.reconnect_backoff_secs", config.discord.reconnect_backoff_secs)?;
    for (key, value) in [
        ("blockchain.poll_range", chain.poll_range),
        ("blockchain.liveness_interval_secs", chain.liveness_interval_secs),
        ("blockchain.subscribe_timeout_secs", chain.subscribe_timeout_secs),
        ("metadata.timeout_secs", config.metadata.timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{key} must be positive")));
        }
    }
    if config.dispatch.dedup_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "dispatch.dedup_capacity must be positive".to_string(),
        ));
    }
    if !matches!(chain.ws_url.scheme(), "ws" | "wss") {
        return Err(ConfigError::ValidationError(format!(
            "blockchain.ws_url must be a ws:// or wss:// URL, got {}",
            chain.ws_url
        )));
    }
    Ok(())
}

fn check_backoff(key: &str, secs: u64) -> Result<(), ConfigError> {
    if BACKOFF_RANGE_SECS.contains(&secs) {
        return Ok(());
    }
    Err(ConfigError::ValidationError(format!(
        "{key} must be between {} and {} seconds, got {secs}",
        BACKOFF_RANGE_SECS.start(),
        BACKOFF_RANGE_SECS.end()
    )))
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let FileConfig {
        blockchain,
        discord,
        metadata,
        dispatch,
    } = file_config;

    let token = discord
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingToken)?;

    let listener = ListenerConfig {
        contract: blockchain.contract,
        lookback_blocks: blockchain.lookback_blocks,
        strategy: blockchain.strategy,
        reconnect_backoff: Duration::from_secs(blockchain.reconnect_backoff_secs),
        liveness_interval: Duration::from_secs(blockchain.liveness_interval_secs),
        fallback_after_failures: blockchain.fallback_after_failures,
        fallback_poll_cycles: blockchain.fallback_poll_cycles,
        poll_range: blockchain.poll_range,
        poll_interval: Duration::from_secs(blockchain.poll_interval_secs),
        poll_backoff: Duration::from_secs(blockchain.poll_backoff_secs),
    };

    let dispatcher = DispatcherConfig {
        destinations: discord.channels.into_iter().map(DestinationId).collect(),
        message: MessageTemplate::new(discord.message_format),
        item_url: MessageTemplate::new(metadata.item_url),
        dedup_capacity: dispatch.dedup_capacity,
        metadata_timeout: Duration::from_secs(metadata.timeout_secs),
    };

    Ok(LoadedConfig {
        chain: ChainEndpoints {
            ens_rpc_url: blockchain
                .ens_rpc_url
                .unwrap_or_else(|| blockchain.rpc_url.clone()),
            rpc_url: blockchain.rpc_url,
            ws_url: blockchain.ws_url,
            ens_registry: blockchain.ens_registry.unwrap_or(ENS_REGISTRY),
            subscribe_timeout: Duration::from_secs(blockchain.subscribe_timeout_secs),
        },
        discord: DiscordSettings {
            token,
            reconnect_backoff: Duration::from_secs(discord.reconnect_backoff_secs),
        },
        metadata_base_url: with_trailing_slash(metadata.base_url),
        listener,
        dispatcher,
    })
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
