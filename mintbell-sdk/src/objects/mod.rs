pub mod discord;
pub mod logs;
pub mod metadata;

pub use discord::{Channel, CreateMessage, CurrentUser, GatewayBot, GatewayPayload};
pub use logs::{LogFilter, RawLog};
pub use metadata::{TokenMetadata, metadata_path};
