//! Event system for the mint pipeline.
//!
//! # Event Flow
//!
//! 1. `MintListener` decodes chain logs and resolves the recipient name
//! 2. `MintListener` publishes `MintEvent` on the notification channel
//! 3. `NotificationDispatcher` renders an `Announcement` per new event
//! 4. `Fanout` delivers the `Announcement` to every `DestinationId`

pub mod channels;
pub mod types;

pub use channels::{MintEventReceiver, MintEventSender, mint_event_channel};
pub use types::{Announcement, DestinationId, MintEvent};
