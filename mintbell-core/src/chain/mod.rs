//! Blockchain capabilities consumed by the listener.
//!
//! The listener is written against the `ChainRpc` and `LogFeed` traits so the
//! subscription state machine can be driven by a real node or by a scripted
//! mock. The JSON-RPC backed implementation lives in [`node`].

pub mod ens;
pub mod node;
pub mod transfer;

pub use ens::EnsReverseResolver;
pub use node::{EvmNode, NodeFeed};
pub use transfer::{ObservedMint, TRANSFER_TOPIC, decode_mint, decode_transfer, transfer_filter};

use async_trait::async_trait;
use mintbell_sdk::client::ClientError;
use mintbell_sdk::objects::{LogFilter, RawLog};
use thiserror::Error;

/// Errors raised by chain access.
#[derive(Debug, Error)]
pub enum ChainError {
    /// HTTP / WebSocket / JSON-RPC failure
    #[error("transport error: {0}")]
    Transport(#[from] ClientError),

    /// The node refused or dropped the log subscription
    #[error("subscription failed: {0}")]
    Subscription(String),
}

/// A live stream of pushed logs.
#[async_trait]
pub trait LogFeed: Send {
    /// Next log, or `None` once the feed has ended.
    async fn next_log(&mut self) -> Option<RawLog>;

    /// Whether the underlying connection is still usable.
    fn is_live(&self) -> bool;
}

/// Read access to the chain.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    type Feed: LogFeed;

    /// Current chain head.
    async fn block_height(&self) -> Result<u64, ChainError>;

    /// Open a push subscription for logs matching `filter`.
    ///
    /// Returns once the filter is registered.
    async fn open_log_stream(&self, filter: &LogFilter) -> Result<Self::Feed, ChainError>;

    /// Logs matching `filter` in the inclusive range `[from, to]`.
    async fn poll_logs(
        &self,
        from: u64,
        to: u64,
        filter: &LogFilter,
    ) -> Result<Vec<RawLog>, ChainError>;
}
