//! EVM log objects as exchanged over JSON-RPC.

use alloy_primitives::{Address, B256, Bytes, U64};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A raw log as returned by `eth_getLogs` or pushed by an
/// `eth_subscribe("logs")` subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    /// `None` for pending logs.
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub log_index: Option<U64>,
    /// Set when the log was dropped by a chain reorganisation.
    #[serde(default)]
    pub removed: bool,
}

impl RawLog {
    pub fn block_number(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }

    pub fn log_index(&self) -> Option<u64> {
        self.log_index.map(|n| n.to::<u64>())
    }
}

/// Log filter scoped to one contract address and a topic list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    /// Positional topic constraints; `None` matches anything.
    pub topics: Vec<Option<B256>>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl LogFilter {
    /// Filter for logs emitted by `address` whose first topic is `topic0`.
    pub fn new(address: Address, topic0: B256) -> Self {
        Self {
            address,
            topics: vec![Some(topic0)],
            from_block: None,
            to_block: None,
        }
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    /// Copy of this filter restricted to `[from, to]`.
    pub fn with_range(&self, from: u64, to: u64) -> Self {
        Self {
            from_block: Some(from),
            to_block: Some(to),
            ..self.clone()
        }
    }

    /// Filter object for `eth_getLogs`.
    pub fn to_rpc_params(&self) -> Value {
        let mut params = self.to_subscription_params();
        if let Some(from) = self.from_block {
            params["fromBlock"] = Value::String(format!("{from:#x}"));
        }
        if let Some(to) = self.to_block {
            params["toBlock"] = Value::String(format!("{to:#x}"));
        }
        params
    }

    /// Filter object for `eth_subscribe("logs")`.
    ///
    /// Push subscriptions only deliver new logs, so the block range is left out.
    pub fn to_subscription_params(&self) -> Value {
        json!({
            "address": self.address,
            "topics": self.topics,
        })
    }
}
