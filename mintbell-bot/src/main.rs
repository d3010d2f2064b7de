//! mintbell
//!
//! Watches an ERC-721 contract for mints and announces them on Discord.

mod chat;
mod config;
mod shutdown;

use anyhow::Context;
use chat::ChatConnection;
use clap::Parser;
use config::ConfigLoader;
use mintbell_core::chain::{EnsReverseResolver, EvmNode};
use mintbell_core::events::mint_event_channel;
use mintbell_core::processors::{MintListener, NotificationDispatcher};
use mintbell_sdk::client::{DiscordClient, JsonRpcClient, MetadataClient};
use shutdown::shutdown_signal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How long tasks get to wind down after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// mintbell - ERC-721 mint announcer for Discord
#[derive(Parser, Debug)]
#[command(name = "mintbell")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "MINTBELL_CONFIG", default_value = "./mintbell.toml")]
    config: PathBuf,

    /// Discord bot token, overriding the config file
    #[arg(long, env = "MINTBELL_DISCORD_TOKEN", hide_env_values = true)]
    discord_token: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(args.log_json);

    tracing::info!("Starting mintbell v{}", env!("CARGO_PKG_VERSION"));

    let loaded = ConfigLoader::new(&args.config, args.discord_token)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let http = reqwest::Client::builder()
        .user_agent(concat!("mintbell/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;

    let node = EvmNode::new(
        JsonRpcClient::new(http.clone(), loaded.chain.rpc_url.clone()),
        loaded.chain.ws_url.as_str(),
        loaded.chain.subscribe_timeout,
    );
    let resolver = EnsReverseResolver::new(
        JsonRpcClient::new(http.clone(), loaded.chain.ens_rpc_url.clone()),
        loaded.chain.ens_registry,
    );
    let discord = DiscordClient::new(http.clone(), loaded.discord.token.as_str())
        .context("failed to build Discord client")?;
    let metadata = MetadataClient::new(http, loaded.metadata_base_url.clone());

    // Channels between tasks
    let (events_tx, events_rx) = mint_event_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (ready_tx, ready_rx) = watch::channel(false);

    let chat = ChatConnection::new(discord.clone(), loaded.discord.reconnect_backoff, ready_tx);
    let listener = MintListener::new(node, resolver, loaded.listener, events_tx);
    let dispatcher = NotificationDispatcher::new(discord, metadata, loaded.dispatcher);

    let mut state_rx = listener.state();
    let state_logger = {
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.wait_for(|stop| *stop) => break,
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        tracing::debug!(state = %*state_rx.borrow(), "Listener state observed");
                    }
                }
            }
        })
    };

    let tasks: Vec<(&str, JoinHandle<()>)> = vec![
        ("chat", tokio::spawn(chat.run(shutdown_rx.clone()))),
        ("listener", tokio::spawn(listener.run(shutdown_rx.clone()))),
        (
            "dispatcher",
            tokio::spawn(dispatcher.run(events_rx, ready_rx, shutdown_rx)),
        ),
        ("state", state_logger),
    ];

    if let Err(e) = shutdown_signal().await {
        tracing::error!(error = %e, "Failed to install signal handlers, shutting down");
    }
    let _ = shutdown_tx.send(true);

    for (name, handle) in tasks {
        match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
            Ok(Ok(())) => tracing::debug!(task = name, "Task finished"),
            Ok(Err(e)) => tracing::error!(task = name, error = %e, "Task failed"),
            Err(_) => tracing::warn!(task = name, "Task did not stop within the grace period"),
        }
    }

    tracing::info!("mintbell shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mintbell_core=info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
