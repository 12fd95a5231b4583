//! Email agent

use crate::agent::{AgentOutcome, AgentRequest};
use crate::config::{truncate_chars, AgentConfig};
use crate::entities::extract_entities;
use crate::mime::{parse_message, ParsedMessage};
use crate::signals::{keyword_urgency, lexicon_sentiment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use triage_domain::{
    ExtractionResult, FieldMap, Format, LanguageCapability, RawInput, Sentiment, StageMarker,
    Urgency,
};

static LOOSE_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*From:\s*([^\n]+)").expect("loose from pattern"));
static LOOSE_SUBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Subject:\s*([^\n]+)").expect("loose subject pattern"));

/// Header fields copied into `fields` under these names
const HEADER_FIELDS: &[(&str, &str)] = &[
    ("To", "to"),
    ("Cc", "cc"),
    ("Date", "date"),
    ("Message-ID", "message_id"),
    ("Reply-To", "reply_to"),
];

/// Extracts sender, subject, urgency and sentiment from messages
pub struct EmailAgent {
    capability: Arc<dyn LanguageCapability>,
    config: AgentConfig,
}

impl EmailAgent {
    /// Create an email agent backed by a language capability
    pub fn new(capability: Arc<dyn LanguageCapability>, config: AgentConfig) -> Self {
        Self { capability, config }
    }

    pub(crate) fn preview(&self, input: &RawInput) -> String {
        let message = parse_message(&input.text_lossy());
        match message.header("Subject") {
            Some(subject) => format!("{}\n{}", subject, message.body),
            None => message.body,
        }
    }

    pub(crate) async fn process(&self, request: &AgentRequest<'_>) -> AgentOutcome {
        let raw = request.input.text_lossy();
        let message = parse_message(&raw);

        let mut result = ExtractionResult::empty(request.format);
        result.sender = header_or_loose(&message, "From", &LOOSE_FROM, &raw);
        result.subject = header_or_loose(&message, "Subject", &LOOSE_SUBJECT, &raw);
        result.content = truncate_chars(&message.body, self.config.max_content_chars).to_string();
        result.attachments = message.attachments.clone();

        for (header, field) in HEADER_FIELDS {
            if let Some(value) = message.header(header) {
                result
                    .fields
                    .insert(field.to_string(), Value::String(value.to_string()));
            }
        }

        let subject = result.subject.clone().unwrap_or_default();
        let scan = format!("{}\n{}", subject, message.body);
        result.key_entities = extract_entities(&scan, self.config.max_entities);
        result.urgency = keyword_urgency(&subject, &message.body);
        result.sentiment = lexicon_sentiment(&scan);
        let keyword_level = result.urgency;

        let mut fallback = false;
        if self.config.capability_fields {
            match self
                .capability
                .extract_fields(&scan, request.intent, Format::Email)
                .await
            {
                Ok(fields) => merge_capability_fields(&mut result, fields),
                Err(e) => {
                    warn!("Email field extraction failed ({}); keeping keyword signals", e);
                    fallback = true;
                }
            }
        }

        debug!(
            "Email for thread {}: urgency {} (keywords {}), sentiment {}, {} attachments",
            request.thread_id,
            result.urgency,
            keyword_level,
            result.sentiment,
            result.attachments.len()
        );

        let detail = format!(
            "urgency {}, sentiment {}, {} attachments, {} fields",
            result.urgency,
            result.sentiment,
            result.attachments.len(),
            result.fields.len()
        );
        let mut outcome = AgentOutcome::new(result).with_detail(detail);
        if fallback {
            outcome.mark(StageMarker::FallbackUsed);
        }
        outcome
    }
}

fn header_or_loose(
    message: &ParsedMessage,
    name: &str,
    pattern: &Regex,
    raw: &str,
) -> Option<String> {
    message
        .header(name)
        .map(str::to_string)
        .or_else(|| {
            pattern
                .captures(raw)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|value| !value.is_empty())
}

/// Fold capability fields into the result
///
/// Urgency never drops below the keyword level. Sentiment is replaced only
/// by a recognised label. Sender and subject fill gaps only.
fn merge_capability_fields(result: &mut ExtractionResult, fields: FieldMap) {
    for (key, value) in fields {
        match key.as_str() {
            "urgency" | "urgency_level" => {
                if let Some(level) = value.as_str().and_then(Urgency::parse) {
                    result.urgency = result.urgency.max(level);
                }
            }
            "sentiment" => {
                if let Some(sentiment) = value.as_str().and_then(Sentiment::parse) {
                    result.sentiment = sentiment;
                }
            }
            "sender" => {
                if result.sender.is_none() {
                    result.sender = value.as_str().map(str::to_string);
                }
            }
            "subject" => {
                if result.subject.is_none() {
                    result.subject = value.as_str().map(str::to_string);
                }
            }
            _ => {
                result.fields.entry(key).or_insert(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merged(fields: Value) -> ExtractionResult {
        let mut result = ExtractionResult::empty(Format::Email);
        result.urgency = Urgency::High;
        result.sentiment = Sentiment::Neutral;
        if let Value::Object(map) = fields {
            merge_capability_fields(&mut result, map);
        }
        result
    }

    #[test]
    fn test_urgency_never_lowered() {
        assert_eq!(merged(json!({"urgency": "low"})).urgency, Urgency::High);
        assert_eq!(
            merged(json!({"urgency_level": "critical"})).urgency,
            Urgency::Critical
        );
    }

    #[test]
    fn test_sentiment_replaced_only_when_valid() {
        assert_eq!(merged(json!({"sentiment": "negative"})).sentiment, Sentiment::Negative);
        assert_eq!(merged(json!({"sentiment": "furious"})).sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_other_fields_added() {
        let result = merged(json!({"order_id": "PO-1", "sender": "a@b.c"}));
        assert_eq!(result.field("order_id"), Some(&json!("PO-1")));
        assert_eq!(result.sender.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_loose_headers() {
        let raw = "Forwarded note\n\nFrom: someone@example.com\nSubject: Hello";
        let message = parse_message(raw);
        assert_eq!(
            header_or_loose(&message, "From", &LOOSE_FROM, raw).as_deref(),
            Some("someone@example.com")
        );
        assert_eq!(
            header_or_loose(&message, "Subject", &LOOSE_SUBJECT, raw).as_deref(),
            Some("Hello")
        );
    }
}
