//! Delivery of one announcement to every destination.
//!
//! Each destination is looked up and sent to independently; a failure is
//! logged and the next destination is still attempted.

use super::ChatPlatform;
use crate::events::{Announcement, DestinationId};
use kanau::processor::Processor;
use std::convert::Infallible;
use tracing::{debug, info, warn};

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub delivered: Vec<DestinationId>,
    /// Missing or non-text channels
    pub skipped: Vec<DestinationId>,
    pub failed: Vec<DestinationId>,
}

pub struct Fanout<P> {
    platform: P,
    destinations: Vec<DestinationId>,
}

impl<P: ChatPlatform> Fanout<P> {
    pub fn new(platform: P, destinations: Vec<DestinationId>) -> Self {
        Self {
            platform,
            destinations,
        }
    }

    pub fn destinations(&self) -> &[DestinationId] {
        &self.destinations
    }

    async fn deliver(&self, destination: DestinationId, text: &str) -> Delivery {
        let channel = match self.platform.sendable_channel(destination).await {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                warn!(%destination, "Channel is missing or cannot take messages, skipping");
                return Delivery::Skipped;
            }
            Err(e) => {
                warn!(%destination, error = %e, "Failed to look up channel");
                return Delivery::Failed;
            }
        };
        match self.platform.send(&channel, text).await {
            Ok(()) => {
                debug!(%destination, "Announcement delivered");
                Delivery::Delivered
            }
            Err(e) => {
                warn!(%destination, error = %e, "Failed to send announcement");
                Delivery::Failed
            }
        }
    }
}

enum Delivery {
    Delivered,
    Skipped,
    Failed,
}

impl<P: ChatPlatform> Processor<Announcement> for Fanout<P> {
    type Output = FanoutReport;
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Fanout", fields(token_id = %announcement.token_id))]
    async fn process(&self, announcement: Announcement) -> Result<FanoutReport, Infallible> {
        let mut report = FanoutReport::default();
        for destination in &self.destinations {
            match self.deliver(*destination, &announcement.text).await {
                Delivery::Delivered => report.delivered.push(*destination),
                Delivery::Skipped => report.skipped.push(*destination),
                Delivery::Failed => report.failed.push(*destination),
            }
        }
        info!(
            delivered = report.delivered.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Announcement fanned out"
        );
        Ok(report)
    }
}
