use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::contract::models::{ContractLanguage, ContractSpec};

pub const DEFAULT_TITLE: &str = "Untitled Contract";
/// Maximum preview length in characters, before the ellipsis.
pub const PREVIEW_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// One persisted conversation. `id` and `created_at` never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    /// Derived from the latest content; not authoritative.
    #[serde(default)]
    pub preview: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub spec: Option<ContractSpec>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<ContractLanguage>,
}

/// Lightweight listing entry; also the value type of the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// The index: conversation id -> summary.
pub type Index = BTreeMap<String, ConversationSummary>;

/// Fields for a create-or-update. `None` means "keep the current value".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationUpdate {
    #[serde(default, rename = "conversationId")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub spec: Option<ContractSpec>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<ContractLanguage>,
}

/// Offset-less ISO-8601, as written by older clients of the bucket.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses RFC 3339, or an offset-less timestamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Conversation {
    pub fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: default_title(),
            preview: String::new(),
            created_at: now,
            updated_at: now,
            messages: vec![],
            spec: None,
            code: None,
            language: None,
        }
    }

    /// Applies the provided fields. `spec`, `code` and `language` replace wholesale;
    /// an empty title counts as not provided.
    pub fn apply(&mut self, update: ConversationUpdate) {
        if let Some(title) = update.title.filter(|t| !t.trim().is_empty()) {
            self.title = title;
        }
        if let Some(messages) = update.messages {
            self.messages = messages;
        }
        if let Some(spec) = update.spec {
            self.spec = Some(spec);
        }
        if let Some(code) = update.code {
            self.code = Some(code);
        }
        if let Some(language) = update.language {
            self.language = Some(language);
        }
    }

    /// Fills `preview` when empty: last message content, else the spec
    /// description, else "Contract: {name}". Leaves it empty otherwise.
    pub fn derive_preview(&mut self) {
        if !self.preview.is_empty() {
            return;
        }
        let last_message = self
            .messages
            .last()
            .map(|m| m.content.as_str())
            .filter(|c| !c.is_empty());

        self.preview = if let Some(content) = last_message {
            truncate_with_ellipsis(content, PREVIEW_MAX_CHARS)
        } else if let Some(description) = self.spec.as_ref().and_then(|s| s.description()) {
            description.chars().take(PREVIEW_MAX_CHARS).collect()
        } else if let Some(spec) = &self.spec {
            format!("Contract: {}", spec.metadata.name)
        } else {
            String::new()
        };
    }

    /// The index entry for this conversation.
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            preview: self.preview.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Summary for list views: the spec description, when present, wins over
    /// the stored preview.
    pub fn list_summary(&self) -> ConversationSummary {
        let mut summary = self.summary();
        if let Some(description) = self.spec.as_ref().and_then(|s| s.description()) {
            summary.preview = description.to_string();
        }
        summary
    }
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_accepts_rfc3339_and_naive() {
        let utc = parse_timestamp("2025-01-01T12:00:00Z").unwrap();
        let offset = parse_timestamp("2025-01-01T14:00:00+02:00").unwrap();
        let naive = parse_timestamp("2025-01-01T12:00:00.123456").unwrap();
        let whole = parse_timestamp("2025-01-01T12:00:00").unwrap();

        assert_eq!(utc, offset);
        assert_eq!(whole, utc);
        assert_eq!(naive.timestamp_subsec_micros(), 123456);
        assert!(parse_timestamp("yesterday").is_none());
    }
    use crate::contract::models::ContractMetadata;

    fn spec(name: &str, description: Option<&str>) -> ContractSpec {
        ContractSpec {
            id: "c1".to_string(),
            metadata: ContractMetadata {
                name: name.to_string(),
                symbol: None,
                description: description.map(String::from),
                short_name: None,
            },
            variables: vec![],
            methods: vec![],
            events: vec![],
            permissions: vec![],
            language: ContractLanguage::Python,
        }
    }

    fn message(content: &str) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_long_message_preview_is_truncated_with_ellipsis() {
        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.messages = vec![message("first"), message(&"A".repeat(200))];
        conversation.derive_preview();
        assert_eq!(conversation.preview.chars().count(), 153);
        assert!(conversation.preview.ends_with("..."));
    }

    #[test]
    fn test_preview_of_exactly_max_length_has_no_ellipsis() {
        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.messages = vec![message(&"B".repeat(PREVIEW_MAX_CHARS))];
        conversation.derive_preview();
        assert_eq!(conversation.preview, "B".repeat(PREVIEW_MAX_CHARS));
    }

    #[test]
    fn test_preview_falls_back_to_spec_description_then_name() {
        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.spec = Some(spec("Token", Some(&"d".repeat(200))));
        conversation.derive_preview();
        assert_eq!(conversation.preview, "d".repeat(PREVIEW_MAX_CHARS));

        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.spec = Some(spec("Token", None));
        conversation.derive_preview();
        assert_eq!(conversation.preview, "Contract: Token");
    }

    #[test]
    fn test_existing_preview_is_not_recomputed() {
        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.preview = "kept".to_string();
        conversation.messages = vec![message("new")];
        conversation.derive_preview();
        assert_eq!(conversation.preview, "kept");
    }

    #[test]
    fn test_apply_keeps_omitted_fields() {
        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.messages = vec![message("hi")];
        conversation.code = Some("print(0)".to_string());

        conversation.apply(ConversationUpdate {
            title: Some("T2".to_string()),
            ..Default::default()
        });

        assert_eq!(conversation.title, "T2");
        assert_eq!(conversation.messages, vec![message("hi")]);
        assert_eq!(conversation.code.as_deref(), Some("print(0)"));
    }

    #[test]
    fn test_apply_ignores_blank_title() {
        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.apply(ConversationUpdate {
            title: Some("".to_string()),
            ..Default::default()
        });
        assert_eq!(conversation.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_list_summary_prefers_spec_description() {
        let mut conversation = Conversation::new("c".to_string(), Utc::now());
        conversation.preview = "from messages".to_string();
        assert_eq!(conversation.list_summary().preview, "from messages");

        conversation.spec = Some(spec("Token", Some("A fungible token")));
        assert_eq!(conversation.list_summary().preview, "A fungible token");
        assert_eq!(conversation.summary().preview, "from messages");
    }

    #[test]
    fn test_update_request_uses_conversation_id_field() {
        let json = r#"{"conversationId": "abc", "code": "print(1)", "language": "csharp"}"#;
        let update: ConversationUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.id.as_deref(), Some("abc"));
        assert_eq!(update.language, Some(ContractLanguage::Csharp));
        assert!(update.messages.is_none());
    }
}
