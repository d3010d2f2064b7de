//! Announcement side of the pipeline: chat and metadata capabilities, the
//! message template and the per-destination fan-out.

pub mod discord;
pub mod fanout;
pub mod metadata;
pub mod template;

pub use discord::SendableChannel;
pub use fanout::{Fanout, FanoutReport};
pub use template::{AnnouncementFields, MessageTemplate};

use crate::events::DestinationId;
use alloy_primitives::U256;
use async_trait::async_trait;
use mintbell_sdk::client::ClientError;
use mintbell_sdk::objects::TokenMetadata;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the chat platform.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat api error: {0}")]
    Client(#[from] ClientError),

    /// The platform refused the message
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Errors raised while fetching token metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Client(#[from] ClientError),

    #[error("metadata request timed out after {0:?}")]
    Timeout(Duration),
}

/// Where announcements are posted.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// A channel that has been checked to accept messages.
    type Channel: Send + Sync;

    /// Look up `id`; `None` if it does not exist or cannot take messages.
    async fn sendable_channel(&self, id: DestinationId)
    -> Result<Option<Self::Channel>, ChatError>;

    async fn send(&self, channel: &Self::Channel, text: &str) -> Result<(), ChatError>;
}

/// Display metadata for minted tokens.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, token_id: U256) -> Result<TokenMetadata, MetadataError>;
}
