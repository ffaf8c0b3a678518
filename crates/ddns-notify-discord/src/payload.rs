//! Discord webhook payload
//!
//! Serde shapes for `POST /api/webhooks/:id/:token` plus the logic that
//! packs a detail list into embed fields within Discord's limits.

use ddns_core::NotifyLevel;
use serde::Serialize;

/// Discord rejects field values of this length or more
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// Discord accepts at most this many fields per embed
pub const MAX_FIELDS: usize = 25;

const ITEM_SEPARATOR: &str = ", ";

/// Top-level webhook body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub tts: bool,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: Footer,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footer {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Embed side-bar color for a level
pub fn level_color(level: NotifyLevel) -> u32 {
    match level {
        NotifyLevel::Info => 0x00FF00,
        NotifyLevel::Warning => 0xFFFF00,
        NotifyLevel::Error => 0xFF0000,
    }
}

/// Whether a level pings the configured user
pub fn level_mentions(level: NotifyLevel) -> bool {
    matches!(level, NotifyLevel::Warning | NotifyLevel::Error)
}

/// Pack `items` into embed fields
///
/// Items are joined with `", "` and a field is closed before its value
/// would reach [`FIELD_VALUE_LIMIT`]. An item that alone reaches the limit
/// is dropped. If items are still left once `MAX_FIELDS - 1` fields are
/// full, the last field reports how many could not be logged.
pub fn distribute_into_fields(items: &[String]) -> Vec<EmbedField> {
    let mut fields = Vec::new();
    let mut value = String::new();
    let mut count = 0;

    for (index, item) in items.iter().enumerate() {
        if item.len() >= FIELD_VALUE_LIMIT {
            tracing::warn!(
                "Dropping notification item of {} characters from embed",
                item.len()
            );
            continue;
        }

        if count > 0 && value.len() + ITEM_SEPARATOR.len() + item.len() >= FIELD_VALUE_LIMIT {
            fields.push(items_field(std::mem::take(&mut value), count));
            count = 0;
        }

        if count == 0 && fields.len() == MAX_FIELDS - 1 {
            let left = items.len() - index;
            fields.push(EmbedField {
                name: "Overflow".to_string(),
                value: format!(
                    "There are too many items. {} Items could not be logged.",
                    left
                ),
                inline: false,
            });
            return fields;
        }

        if count > 0 {
            value.push_str(ITEM_SEPARATOR);
        }
        value.push_str(item);
        count += 1;
    }

    if count > 0 {
        fields.push(items_field(value, count));
    }
    fields
}

fn items_field(value: String, count: usize) -> EmbedField {
    EmbedField {
        name: format!("Containing {} items", count),
        value,
        inline: false,
    }
}
