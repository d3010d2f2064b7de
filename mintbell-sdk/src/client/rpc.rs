//! Ethereum JSON-RPC over HTTP.

use alloy_primitives::{Address, Bytes, U64};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{LogFilter, RawLog};

/// Minimal JSON-RPC client for the handful of `eth_*` methods the bot needs.
///
/// Cloning is cheap; clones share the HTTP connection pool and the request
/// id counter.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: Client,
    url: Url,
    next_id: Arc<AtomicU64>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    pub fn new(http: Client, url: Url) -> Self {
        Self {
            http,
            url,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issue one JSON-RPC call and decode its `result`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self.http.post(self.url.clone()).json(&body).send().await?;
        let envelope: RpcResponse<T> = parse_response(resp).await?;

        if let Some(error) = envelope.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        envelope
            .result
            .ok_or_else(|| ClientError::Unexpected(format!("{method} returned no result")))
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<u64, ClientError> {
        let number: U64 = self.call("eth_blockNumber", json!([])).await?;
        Ok(number.to::<u64>())
    }

    /// `eth_getLogs`
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, ClientError> {
        self.call("eth_getLogs", json!([filter.to_rpc_params()]))
            .await
    }

    /// `eth_call` against the latest block.
    pub async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError> {
        self.call(
            "eth_call",
            json!([{ "to": to, "data": data }, "latest"]),
        )
        .await
    }
}
