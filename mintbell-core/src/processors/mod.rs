//! Long-running processors of the pipeline:
//!
//! - `MintListener`: watches contract logs, emits `MintEvent`
//! - `NotificationDispatcher`: receives `MintEvent`, posts announcements

pub mod dispatcher;
pub mod listener;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use listener::{ListenerError, ListenerState, LogCursor, MintListener};
