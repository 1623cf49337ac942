//! Content extracted from asset binaries.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whitespace and literal escape sequences (`\r`, `\n`, `\t`, `\v`) that extraction
/// backends leave in the text body.
static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s|\\[rntv])+").expect("Invalid whitespace regex"));

/// Raw attachment fields as returned by the extraction pipeline.
///
/// Every field is optional on the wire; missing ones deserialize to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedAttachment {
    pub content: String,
    pub title: String,
    pub name: String,
    pub author: String,
    pub keywords: String,
    pub date: String,
    pub content_type: String,
    pub content_length: u64,
    pub language: String,
}

impl ExtractedAttachment {
    /// Read the attachment object field by field.
    ///
    /// A field that is missing or has an unexpected type falls back to its default
    /// without affecting the others. `content_length` also accepts a numeric string.
    pub fn from_value(value: &Value) -> Self {
        let text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let content_length = match value.get("content_length") {
            Some(Value::Number(number)) => number.as_u64().unwrap_or_default(),
            Some(Value::String(length)) => length.trim().parse().unwrap_or_default(),
            _ => 0,
        };

        Self {
            content: text("content"),
            title: text("title"),
            name: text("name"),
            author: text("author"),
            keywords: text("keywords"),
            date: text("date"),
            content_type: text("content_type"),
            content_length,
            language: text("language"),
        }
    }
}

/// Immutable value object holding the text and metadata extracted from an asset.
///
/// The text body is normalized on construction: every run of whitespace (including
/// literal escape sequences) becomes a single space and the result is trimmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedContent {
    content: String,
    title: String,
    name: String,
    author: String,
    keywords: String,
    date: Option<DateTime<FixedOffset>>,
    content_type: String,
    content_length: u64,
    language: String,
}

impl ExtractedContent {
    /// Content with every field empty, used whenever extraction is skipped or fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.date
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn normalize_whitespace(text: &str) -> String {
        WHITESPACE_RUNS.replace_all(text, " ").trim().to_string()
    }
}

impl From<ExtractedAttachment> for ExtractedContent {
    fn from(attachment: ExtractedAttachment) -> Self {
        let date = if attachment.date.is_empty() {
            None
        } else {
            DateTime::parse_from_rfc3339(&attachment.date).ok()
        };

        Self {
            content: Self::normalize_whitespace(&attachment.content),
            title: attachment.title,
            name: attachment.name,
            author: attachment.author,
            keywords: attachment.keywords,
            date,
            content_type: attachment.content_type,
            content_length: attachment.content_length,
            language: attachment.language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_whitespace_is_collapsed() {
        let content = ExtractedContent::from(ExtractedAttachment {
            content: "  Hello \n\n\t world\\r\\nagain\\t \\v end  ".to_string(),
            ..Default::default()
        });
        assert_eq!(content.content(), "Hello world again end");
    }

    #[test]
    fn test_date_is_parsed_when_present() {
        let content = ExtractedContent::from(ExtractedAttachment {
            date: "2023-04-01T10:15:00+02:00".to_string(),
            ..Default::default()
        });
        let date = content.date().unwrap();
        assert_eq!(date.to_rfc3339(), "2023-04-01T10:15:00+02:00");
    }

    #[test]
    fn test_unparseable_date_is_none() {
        let content = ExtractedContent::from(ExtractedAttachment {
            date: "last tuesday".to_string(),
            ..Default::default()
        });
        assert!(content.date().is_none());
    }

    #[test]
    fn test_attachment_deserializes_partial_payload() {
        let attachment: ExtractedAttachment = serde_json::from_str(
            r#"{"content":"Text","content_type":"application/pdf","content_length":4}"#,
        )
        .unwrap();
        let content = ExtractedContent::from(attachment);
        assert_eq!(content.content(), "Text");
        assert_eq!(content.content_type(), "application/pdf");
        assert_eq!(content.content_length(), 4);
        assert_eq!(content.title(), "");
    }

    #[test]
    fn test_mistyped_field_keeps_the_others() {
        let attachment = ExtractedAttachment::from_value(&serde_json::json!({
            "content": "Body text",
            "title": 42,
            "author": null,
            "content_type": "text/plain",
            "content_length": "9"
        }));
        assert_eq!(attachment.content, "Body text");
        assert_eq!(attachment.title, "");
        assert_eq!(attachment.author, "");
        assert_eq!(attachment.content_type, "text/plain");
        assert_eq!(attachment.content_length, 9);

        let attachment = ExtractedAttachment::from_value(&serde_json::json!({
            "content": "Body text",
            "content_length": -3
        }));
        assert_eq!(attachment.content_length, 0);
    }

    #[test]
    fn test_empty() {
        let content = ExtractedContent::empty();
        assert!(content.is_empty());
        assert_eq!(content.content_length(), 0);
    }
}
