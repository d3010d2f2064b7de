//! NotificationDispatcher processor.
//!
//! The NotificationDispatcher is responsible for:
//! - Waiting until the chat connection is ready before consuming events
//! - Dropping events whose token id was announced recently
//! - Fetching display metadata, bounded by a timeout
//! - Rendering the announcement once and fanning it out to every destination
//!
//! Events are handled strictly one at a time in arrival order.

use crate::announce::{
    AnnouncementFields, ChatPlatform, Fanout, FanoutReport, MessageTemplate, MetadataError,
    MetadataSource,
};
use crate::config::DispatcherConfig;
use crate::events::{Announcement, MintEvent, MintEventReceiver};
use crate::utils::DedupRing;
use crate::utils::shutdown::{or_shutdown, wait_for_shutdown};
use alloy_primitives::U256;
use kanau::processor::Processor;
use mintbell_sdk::objects::TokenMetadata;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Announced recently; nothing was sent.
    Duplicate,
    Announced(FanoutReport),
}

/// NotificationDispatcher announces `MintEvent`s.
pub struct NotificationDispatcher<P, M> {
    fanout: Fanout<P>,
    metadata: M,
    message: MessageTemplate,
    item_url: MessageTemplate,
    metadata_timeout: Duration,
    seen: DedupRing<U256>,
}

impl<P, M> NotificationDispatcher<P, M>
where
    P: ChatPlatform,
    M: MetadataSource,
{
    pub fn new(platform: P, metadata: M, config: DispatcherConfig) -> Self {
        Self {
            fanout: Fanout::new(platform, config.destinations),
            metadata,
            message: config.message,
            item_url: config.item_url,
            metadata_timeout: config.metadata_timeout,
            seen: DedupRing::new(config.dedup_capacity),
        }
    }

    /// Run until shutdown is signaled or the channel closes.
    ///
    /// Nothing is consumed before `ready_rx` first reports `true`; events
    /// queue up in the channel until then.
    pub async fn run(
        mut self,
        mut events_rx: MintEventReceiver,
        mut ready_rx: watch::Receiver<bool>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!(
            destinations = self.fanout.destinations().len(),
            "NotificationDispatcher waiting for chat connection"
        );
        tokio::select! {
            biased;

            _ = wait_for_shutdown(&mut shutdown_rx) => {
                info!("NotificationDispatcher received shutdown signal before ready");
                return;
            }

            ready = ready_rx.wait_for(|ready| *ready) => {
                if ready.is_err() {
                    warn!("Chat connection went away before becoming ready");
                    return;
                }
            }
        }
        info!("NotificationDispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("NotificationDispatcher received shutdown signal");
                    break;
                }

                event = events_rx.recv() => {
                    let Some(event) = event else {
                        info!("MintEvent channel closed");
                        break;
                    };
                    debug!(token_id = %event.token_id, block = event.block_number, "Received MintEvent");
                    if or_shutdown(&mut shutdown_rx, self.handle(event)).await.is_none() {
                        info!("NotificationDispatcher interrupted by shutdown");
                        break;
                    }
                }
            }
        }

        info!("NotificationDispatcher shutdown complete");
    }

    /// Announce one event unless it is a recent duplicate.
    pub async fn handle(&mut self, event: MintEvent) -> DispatchOutcome {
        if self.seen.check_and_record(event.token_id) {
            debug!(token_id = %event.token_id, "Already announced, skipping");
            return DispatchOutcome::Duplicate;
        }

        let metadata = self.fetch_metadata(event.token_id).await;
        let fields = AnnouncementFields::new(&event, metadata.as_ref(), &self.item_url);
        let announcement = Announcement {
            token_id: event.token_id,
            text: self.message.render(&fields),
        };
        let report = match self.fanout.process(announcement).await {
            Ok(report) => report,
            Err(never) => match never {},
        };
        DispatchOutcome::Announced(report)
    }

    async fn fetch_metadata(&self, token_id: U256) -> Option<TokenMetadata> {
        let result = tokio::time::timeout(self.metadata_timeout, self.metadata.fetch(token_id))
            .await
            .unwrap_or(Err(MetadataError::Timeout(self.metadata_timeout)));
        match result {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(token_id = %token_id, error = %e, "Metadata unavailable, using token id");
                None
            }
        }
    }
}
