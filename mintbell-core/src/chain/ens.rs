//! ENS reverse resolution over plain `eth_call`.
//!
//! Resolution follows the primary-name flow: hash
//! `<address>.addr.reverse`, ask the registry for that node's resolver,
//! then ask the resolver for `name(node)`.

use alloy_primitives::{Address, B256, Bytes, U256, address, hex, keccak256};
use async_trait::async_trait;
use mintbell_sdk::client::JsonRpcClient;

use crate::naming::{NameResolver, ResolveError};

/// ENS registry, same address on mainnet and the public testnets.
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// `resolver(bytes32)`
const RESOLVER_SELECTOR: [u8; 4] = [0x01, 0x78, 0xb8, 0xbf];
/// `name(bytes32)`
const NAME_SELECTOR: [u8; 4] = [0x69, 0x1f, 0x34, 0x31];

/// Reverse resolver backed by a JSON-RPC node.
#[derive(Debug, Clone)]
pub struct EnsReverseResolver {
    rpc: JsonRpcClient,
    registry: Address,
}

impl EnsReverseResolver {
    pub fn new(rpc: JsonRpcClient, registry: Address) -> Self {
        Self { rpc, registry }
    }
}

#[async_trait]
impl NameResolver for EnsReverseResolver {
    async fn reverse_resolve(&self, address: Address) -> Result<String, ResolveError> {
        let node = reverse_node(address);

        let reply = self
            .rpc
            .eth_call(self.registry, call_data(RESOLVER_SELECTOR, node))
            .await?;
        let resolver = decode_address(&reply)?;
        if resolver == Address::ZERO {
            return Err(ResolveError::NotFound);
        }

        let reply = self
            .rpc
            .eth_call(resolver, call_data(NAME_SELECTOR, node))
            .await?;
        let name = decode_string(&reply)?;
        if name.is_empty() {
            return Err(ResolveError::NotFound);
        }
        Ok(name)
    }
}

/// ENS namehash of a dotted name.
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(label_hash.as_slice());
        node = keccak256(buf);
    }
    node
}

/// Node of `<lowercase hex address>.addr.reverse`.
pub fn reverse_node(address: Address) -> B256 {
    namehash(&format!("{}.addr.reverse", hex::encode(address)))
}

fn call_data(selector: [u8; 4], node: B256) -> Bytes {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector);
    data.extend_from_slice(node.as_slice());
    data.into()
}

fn word(data: &[u8], index: usize) -> Result<&[u8], ResolveError> {
    let start = index
        .checked_mul(32)
        .ok_or_else(|| ResolveError::Malformed("offset overflow".to_string()))?;
    data.get(start..start + 32)
        .ok_or_else(|| ResolveError::Malformed(format!("missing word {index}")))
}

/// Decode an ABI-encoded `address` return value.
fn decode_address(data: &[u8]) -> Result<Address, ResolveError> {
    let word = word(data, 0)?;
    let (padding, address) = word.split_at(12);
    if padding.iter().any(|b| *b != 0) {
        return Err(ResolveError::Malformed("dirty address word".to_string()));
    }
    Ok(Address::from_slice(address))
}

/// Decode an ABI-encoded dynamic `string` return value.
fn decode_string(data: &[u8]) -> Result<String, ResolveError> {
    let as_usize = |w: &[u8]| -> Result<usize, ResolveError> {
        usize::try_from(U256::from_be_slice(w))
            .map_err(|_| ResolveError::Malformed("length does not fit".to_string()))
    };
    let offset = as_usize(word(data, 0)?)?;
    let len_word = data
        .get(offset..offset.saturating_add(32))
        .ok_or_else(|| ResolveError::Malformed("string offset out of range".to_string()))?;
    let len = as_usize(len_word)?;
    let start = offset + 32;
    let bytes = data
        .get(start..start.saturating_add(len))
        .ok_or_else(|| ResolveError::Malformed("string body out of range".to_string()))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| ResolveError::Malformed(e.to_string()))
}
