//! Display names for recipient addresses.

use alloy_primitives::Address;
use async_trait::async_trait;
use mintbell_sdk::client::ClientError;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during reverse resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// RPC failure
    #[error("rpc error: {0}")]
    Client(#[from] ClientError),

    /// The address has no primary name
    #[error("no reverse record")]
    NotFound,

    /// The node returned data that is not a valid ABI value
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Reverse-name lookup (address → human readable name).
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn reverse_resolve(&self, address: Address) -> Result<String, ResolveError>;
}

/// Short form of an address: first 6 characters, `…`, last 4 characters.
///
/// Strings too short to shorten are returned unchanged.
pub fn truncated_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Resolves addresses to display names, never failing.
///
/// One lookup attempt per call, no retry. Any failure falls back to
/// [`truncated_address`] of the checksummed address.
pub struct DisplayNames<R> {
    resolver: R,
}

impl<R: NameResolver> DisplayNames<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub async fn display_name(&self, address: Address) -> String {
        match self.resolver.reverse_resolve(address).await {
            Ok(name) => name,
            Err(e) => {
                debug!(%address, error = %e, "Reverse resolution failed, using short address");
                truncated_address(&address.to_checksum(None))
            }
        }
    }
}
