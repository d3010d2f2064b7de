//! Announcement templates.
//!
//! Templates use named placeholders in braces. Recognised names:
//!
//! | placeholder   | value                                         |
//! |---------------|-----------------------------------------------|
//! | `{name}`      | metadata name, or the bare token id           |
//! | `{id}`        | token id in decimal                           |
//! | `{id4}`       | token id zero-padded to four digits           |
//! | `{recipient}` | resolved recipient name or short address      |
//! | `{url}`       | canonical item URL (rendered from `item_url`) |
//! | `{image}`     | metadata image URL, empty when unknown        |
//!
//! Anything else in braces is copied to the output unchanged. Substituted
//! values are never scanned again.

use crate::events::MintEvent;
use mintbell_sdk::objects::TokenMetadata;

pub const DEFAULT_MESSAGE_FORMAT: &str = "{name} was just minted by {recipient}!\n{url}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
}

impl MessageTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, fields: &AnnouncementFields) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        let mut rest = self.source.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let key = &after[..close];
            if key.contains('{') {
                // `{{name}`: the first brace is literal, retry from the second.
                out.push('{');
                rest = after;
                continue;
            }
            match fields.get(key) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('{');
                    out.push_str(key);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_FORMAT)
    }
}

/// Placeholder values for one mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementFields {
    pub name: String,
    pub id: String,
    pub id4: String,
    pub recipient: String,
    pub url: String,
    pub image: String,
}

impl AnnouncementFields {
    /// Build the fields for `event`.
    ///
    /// Without metadata the name is the bare token id. `item_url` may use
    /// every placeholder except `{url}`.
    pub fn new(
        event: &MintEvent,
        metadata: Option<&TokenMetadata>,
        item_url: &MessageTemplate,
    ) -> Self {
        let id = event.token_id.to_string();
        let mut fields = Self {
            name: metadata.map_or_else(|| id.clone(), |m| m.name.clone()),
            id4: format!("{id:0>4}"),
            id,
            recipient: event.recipient.clone(),
            url: String::new(),
            image: metadata
                .and_then(|m| m.image.clone())
                .unwrap_or_default(),
        };
        fields.url = item_url.render(&fields);
        fields
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "id" => Some(&self.id),
            "id4" => Some(&self.id4),
            "recipient" => Some(&self.recipient),
            "url" => Some(&self.url),
            "image" => Some(&self.image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn event(id: u64) -> MintEvent {
        MintEvent {
            recipient: "alice.eth".to_string(),
            token_id: U256::from(id),
            block_number: 1,
        }
    }

    fn item_url() -> MessageTemplate {
        MessageTemplate::new("https://example.com/items/{id4}")
    }

    #[test]
    fn test_render_with_metadata() {
        let meta = TokenMetadata {
            name: "Pluggy #7".to_string(),
            image: Some("https://example.com/7.png".to_string()),
        };
        let fields = AnnouncementFields::new(&event(7), Some(&meta), &item_url());
        let text = MessageTemplate::default().render(&fields);
        assert_eq!(
            text,
            "Pluggy #7 was just minted by alice.eth!\nhttps://example.com/items/0007"
        );
        assert_eq!(
            MessageTemplate::new("{image}").render(&fields),
            "https://example.com/7.png"
        );
    }

    #[test]
    fn test_render_without_metadata_uses_token_id() {
        let fields = AnnouncementFields::new(&event(340), None, &item_url());
        let text = MessageTemplate::new("{name} / {id} / {id4} / [{image}]").render(&fields);
        assert_eq!(text, "340 / 340 / 0340 / []");
    }

    #[test]
    fn test_unknown_placeholders_are_verbatim() {
        let fields = AnnouncementFields::new(&event(1), None, &item_url());
        let text = MessageTemplate::new("{owner} got {id} {").render(&fields);
        assert_eq!(text, "{owner} got 1 {");
    }

    #[test]
    fn test_doubled_brace() {
        let fields = AnnouncementFields::new(&event(1), None, &item_url());
        assert_eq!(MessageTemplate::new("{{id}}").render(&fields), "{1}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let meta = TokenMetadata {
            name: "{recipient}".to_string(),
            image: None,
        };
        let fields = AnnouncementFields::new(&event(1), Some(&meta), &item_url());
        assert_eq!(MessageTemplate::new("{name}").render(&fields), "{recipient}");
    }

    #[test]
    fn test_long_ids_are_not_truncated() {
        let fields = AnnouncementFields::new(&event(123_456), None, &item_url());
        assert_eq!(fields.id4, "123456");
        assert_eq!(fields.url, "https://example.com/items/123456");
    }
}
