//! Runtime configuration for the pipeline.
//!
//! These are the validated values the processors run with. Loading and
//! validating the configuration file is done by the bot crate.

mod dispatcher;
mod listener;

pub use dispatcher::DispatcherConfig;
pub use listener::{ListenerConfig, SubscriptionStrategy};
