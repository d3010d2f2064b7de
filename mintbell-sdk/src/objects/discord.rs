//! Discord REST and gateway payloads.
//!
//! Only the handful of fields the bot actually reads are modelled.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

/// Gateway opcodes used by the bot.
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// `GET /users/@me`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

/// `GET /gateway/bot`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayBot {
    pub url: String,
}

/// `GET /channels/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl Channel {
    /// Whether messages can be posted to this channel.
    ///
    /// Text, DM, group DM, announcement and thread channels accept messages;
    /// voice, category, forum and stage channels do not.
    pub fn is_text_based(&self) -> bool {
        matches!(self.kind, 0 | 1 | 3 | 5 | 10 | 11 | 12)
    }
}

/// `POST /channels/{id}/messages`
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessage<'a> {
    pub content: &'a str,
}

/// A gateway frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    /// Identify with no privileged intents; the bot only posts messages.
    pub fn identify(token: &str) -> Self {
        Self {
            op: opcode::IDENTIFY,
            d: json!({
                "token": token,
                "intents": 0,
                "properties": {
                    "os": std::env::consts::OS,
                    "browser": "mintbell",
                    "device": "mintbell",
                },
            }),
            s: None,
            t: None,
        }
    }

    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: opcode::HEARTBEAT,
            d: last_sequence.map_or(Value::Null, Value::from),
            s: None,
            t: None,
        }
    }

    /// Heartbeat interval carried by a Hello frame.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        if self.op != opcode::HELLO {
            return None;
        }
        self.d
            .get("heartbeat_interval")
            .and_then(Value::as_u64)
            .map(Duration::from_millis)
    }

    pub fn is_dispatch(&self, event: &str) -> bool {
        self.op == opcode::DISPATCH && self.t.as_deref() == Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_interval() {
        let hello: GatewayPayload =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
                .unwrap();
        assert_eq!(hello.heartbeat_interval(), Some(Duration::from_millis(41250)));

        let ack: GatewayPayload = serde_json::from_str(r#"{"op":11}"#).unwrap();
        assert_eq!(ack.heartbeat_interval(), None);
    }

    #[test]
    fn test_heartbeat_serialization() {
        let first = serde_json::to_string(&GatewayPayload::heartbeat(None)).unwrap();
        assert_eq!(first, r#"{"op":1,"d":null}"#);
        let next = serde_json::to_string(&GatewayPayload::heartbeat(Some(42))).unwrap();
        assert_eq!(next, r#"{"op":1,"d":42}"#);
    }

    #[test]
    fn test_ready_dispatch() {
        let ready: GatewayPayload =
            serde_json::from_str(r#"{"op":0,"d":{"v":10},"s":1,"t":"READY"}"#).unwrap();
        assert!(ready.is_dispatch("READY"));
        assert_eq!(ready.s, Some(1));
    }

    #[test]
    fn test_text_channel_detection() {
        let text: Channel = serde_json::from_str(r#"{"id":"1","type":0,"name":"mints"}"#).unwrap();
        let voice: Channel = serde_json::from_str(r#"{"id":"2","type":2}"#).unwrap();
        assert!(text.is_text_based());
        assert!(!voice.is_text_based());
    }
}
