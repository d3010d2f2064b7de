use async_trait::async_trait;
use mintbell_sdk::client::DiscordClient;
use tracing::debug;

use super::{ChatError, ChatPlatform};
use crate::events::DestinationId;

/// A Discord channel that accepts messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendableChannel {
    pub id: DestinationId,
    pub name: Option<String>,
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    type Channel = SendableChannel;

    async fn sendable_channel(
        &self,
        id: DestinationId,
    ) -> Result<Option<SendableChannel>, ChatError> {
        let Some(channel) = self.channel(id.0).await? else {
            return Ok(None);
        };
        if !channel.is_text_based() {
            debug!(destination = %id, kind = channel.kind, "Channel does not accept messages");
            return Ok(None);
        }
        Ok(Some(SendableChannel {
            id,
            name: channel.name,
        }))
    }

    async fn send(&self, channel: &SendableChannel, text: &str) -> Result<(), ChatError> {
        Ok(self.create_message(channel.id.0, text).await?)
    }
}

