//! Dispatcher configuration.

use crate::announce::MessageTemplate;
use crate::events::DestinationId;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Chat channels every announcement is sent to.
    pub destinations: Vec<DestinationId>,
    pub message: MessageTemplate,
    /// Template for the `{url}` placeholder.
    pub item_url: MessageTemplate,
    /// Number of recent token ids remembered for deduplication.
    pub dedup_capacity: usize,
    /// Upper bound on one metadata request.
    pub metadata_timeout: Duration,
}
