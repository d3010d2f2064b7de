//! ERC-721 `Transfer` decoding and the mint filter.

use alloy_primitives::{Address, B256, U256, b256};
use mintbell_sdk::objects::{LogFilter, RawLog};
use thiserror::Error;
use tracing::{debug, warn};

/// `keccak256("Transfer(address,address,uint256)")`
pub const TRANSFER_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// Errors raised while decoding a log as an ERC-721 transfer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("log has no topics")]
    Anonymous,

    #[error("unexpected event signature {0}")]
    Signature(B256),

    /// ERC-20 transfers share the signature but index only three topics.
    #[error("expected 4 topics, found {0}")]
    TopicCount(usize),

    #[error("topic {0} is not a left-padded address")]
    DirtyAddress(B256),
}

/// A decoded `Transfer(from, to, tokenId)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub token_id: U256,
}

/// A transfer from the zero address, before the recipient name is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedMint {
    pub to: Address,
    pub token_id: U256,
    pub block_number: u64,
    pub log_index: Option<u64>,
}

/// The filter the listener registers: `Transfer` events of `contract`.
pub fn transfer_filter(contract: Address) -> LogFilter {
    LogFilter::new(contract, TRANSFER_TOPIC)
}

pub fn decode_transfer(log: &RawLog) -> Result<Transfer, DecodeError> {
    let topic0 = log.topics.first().ok_or(DecodeError::Anonymous)?;
    if *topic0 != TRANSFER_TOPIC {
        return Err(DecodeError::Signature(*topic0));
    }
    let [_, from, to, token_id] = log.topics.as_slice() else {
        return Err(DecodeError::TopicCount(log.topics.len()));
    };
    Ok(Transfer {
        from: topic_address(from)?,
        to: topic_address(to)?,
        token_id: U256::from_be_bytes(token_id.0),
    })
}

/// Decode `log` and keep it only if it is a mint.
///
/// Malformed logs are logged and rejected; they never stop the caller.
pub fn decode_mint(log: &RawLog) -> Option<ObservedMint> {
    if log.removed {
        debug!(tx = ?log.transaction_hash, "Skipping log removed by reorg");
        return None;
    }
    let transfer = match decode_transfer(log) {
        Ok(transfer) => transfer,
        Err(e) => {
            warn!(
                error = %e,
                tx = ?log.transaction_hash,
                "Found non-standard transfer log"
            );
            return None;
        }
    };
    if transfer.from != Address::ZERO {
        return None;
    }
    Some(ObservedMint {
        to: transfer.to,
        token_id: transfer.token_id,
        block_number: log.block_number().unwrap_or_default(),
        log_index: log.log_index(),
    })
}

fn topic_address(word: &B256) -> Result<Address, DecodeError> {
    let (padding, address) = word.as_slice().split_at(12);
    if padding.iter().any(|b| *b != 0) {
        return Err(DecodeError::DirtyAddress(*word));
    }
    Ok(Address::from_slice(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{address_topic, transfer_log};
    use alloy_primitives::{address, keccak256};

    const RECIPIENT: Address = address!("d3c7a31c4b0d50e8b6bb48e2a2a0a3f3a1e0f4f0");
    const SENDER: Address = address!("1111111111111111111111111111111111111111");

    #[test]
    fn test_transfer_topic_is_signature_hash() {
        assert_eq!(TRANSFER_TOPIC, keccak256("Transfer(address,address,uint256)"));
    }

    #[test]
    fn test_mint_is_forwarded() {
        let log = transfer_log(Address::ZERO, RECIPIENT, 340, 100, 0);
        let mint = decode_mint(&log).unwrap();
        assert_eq!(mint.to, RECIPIENT);
        assert_eq!(mint.token_id, U256::from(340));
        assert_eq!(mint.block_number, 100);
        assert_eq!(mint.log_index, Some(0));
    }

    #[test]
    fn test_regular_transfer_is_dropped() {
        let log = transfer_log(SENDER, RECIPIENT, 340, 100, 0);
        assert!(decode_transfer(&log).is_ok());
        assert_eq!(decode_mint(&log), None);
    }

    #[test]
    fn test_zero_address_match_ignores_case() {
        // Hex case only exists in the textual form; both spellings decode to
        // the same bytes.
        let upper: RawLog = serde_json::from_value(serde_json::json!({
            "address": "0x5B8BF1BCB3C7BD8E4FEC2B3BD62D4D1B4AE5B2A0",
            "topics": [
                TRANSFER_TOPIC,
                "0x0000000000000000000000000000000000000000000000000000000000000000",
                "0x000000000000000000000000D3C7A31C4B0D50E8B6BB48E2A2A0A3F3A1E0F4F0",
                "0x000000000000000000000000000000000000000000000000000000000000000A"
            ],
            "data": "0x",
            "blockNumber": "0x1",
            "logIndex": "0x0"
        }))
        .unwrap();
        let mint = decode_mint(&upper).unwrap();
        assert_eq!(mint.to, RECIPIENT);
        assert_eq!(mint.token_id, U256::from(10));
    }

    #[test]
    fn test_erc20_transfer_is_rejected() {
        let mut log = transfer_log(Address::ZERO, RECIPIENT, 1, 100, 0);
        log.topics.pop();
        assert_eq!(decode_transfer(&log), Err(DecodeError::TopicCount(3)));
        assert_eq!(decode_mint(&log), None);
    }

    #[test]
    fn test_other_event_is_rejected() {
        let mut log = transfer_log(Address::ZERO, RECIPIENT, 1, 100, 0);
        let approval = keccak256("Approval(address,address,uint256)");
        log.topics[0] = approval;
        assert_eq!(decode_transfer(&log), Err(DecodeError::Signature(approval)));
        assert_eq!(decode_mint(&log), None);
    }

    #[test]
    fn test_dirty_address_topic_is_rejected() {
        let mut log = transfer_log(Address::ZERO, RECIPIENT, 1, 100, 0);
        let mut word = address_topic(RECIPIENT);
        word.0[0] = 0xff;
        log.topics[2] = word;
        assert_eq!(decode_transfer(&log), Err(DecodeError::DirtyAddress(word)));
    }

    #[test]
    fn test_removed_log_is_dropped() {
        let mut log = transfer_log(Address::ZERO, RECIPIENT, 1, 100, 0);
        log.removed = true;
        assert_eq!(decode_mint(&log), None);
    }
}
