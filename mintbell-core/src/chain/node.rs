//! `ChainRpc` backed by a JSON-RPC node (HTTP for queries, WebSocket for
//! the push subscription).

use async_trait::async_trait;
use mintbell_sdk::client::{JsonRpcClient, LogStream};
use mintbell_sdk::objects::{LogFilter, RawLog};
use std::time::Duration;
use tracing::debug;

use super::{ChainError, ChainRpc, LogFeed};

pub struct EvmNode {
    rpc: JsonRpcClient,
    ws_url: String,
    subscribe_timeout: Duration,
}

impl EvmNode {
    /// * `rpc` - HTTP JSON-RPC client used for `eth_blockNumber` and `eth_getLogs`
    /// * `ws_url` - WebSocket endpoint used for `eth_subscribe`
    /// * `subscribe_timeout` - bound on connecting and on the subscription ack
    pub fn new(rpc: JsonRpcClient, ws_url: impl Into<String>, subscribe_timeout: Duration) -> Self {
        Self {
            rpc,
            ws_url: ws_url.into(),
            subscribe_timeout,
        }
    }
}

/// A `LogStream` seen through the `LogFeed` trait.
pub struct NodeFeed {
    stream: LogStream,
}

#[async_trait]
impl LogFeed for NodeFeed {
    async fn next_log(&mut self) -> Option<RawLog> {
        self.stream.next().await
    }

    fn is_live(&self) -> bool {
        self.stream.is_open()
    }
}

#[async_trait]
impl ChainRpc for EvmNode {
    type Feed = NodeFeed;

    async fn block_height(&self) -> Result<u64, ChainError> {
        Ok(self.rpc.block_number().await?)
    }

    async fn open_log_stream(&self, filter: &LogFilter) -> Result<NodeFeed, ChainError> {
        let stream = LogStream::subscribe(&self.ws_url, filter, self.subscribe_timeout).await?;
        debug!(subscription = stream.subscription_id(), "Opened log feed");
        Ok(NodeFeed { stream })
    }

    async fn poll_logs(
        &self,
        from: u64,
        to: u64,
        filter: &LogFilter,
    ) -> Result<Vec<RawLog>, ChainError> {
        Ok(self.rpc.get_logs(&filter.with_range(from, to)).await?)
    }
}
