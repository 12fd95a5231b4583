//! Extraction results produced by the format agents

use crate::labels::{Format, Sentiment, Urgency};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of entity pulled out of free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Calendar date
    Date,
    /// Ticket, order or invoice reference
    Reference,
    /// Currency amount
    Amount,
    /// Email address
    EmailAddress,
    /// Capitalized name sequence
    ProperNoun,
}

/// An entity found in document text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEntity {
    /// Entity kind
    pub kind: EntityKind,
    /// Text as it appeared in the source
    pub value: String,
}

impl KeyEntity {
    /// Create a new entity
    pub fn new(kind: EntityKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// What went wrong with a field during schema validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A required field is absent
    MissingField,

    /// A field is present but has the wrong JSON type
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Type actually found
        found: String,
    },

    /// The payload shape itself was unusual (arrays, wrappers)
    Structure,
}

/// A non-fatal validation finding attached to a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationAnomaly {
    /// Canonical field name the finding refers to
    pub field: String,
    /// Finding kind
    pub kind: AnomalyKind,
    /// Human readable description
    pub message: String,
}

impl ValidationAnomaly {
    /// Required field is missing
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("required field '{}' is missing", field),
            field,
            kind: AnomalyKind::MissingField,
        }
    }

    /// Field has an unexpected type
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let expected = expected.into();
        let found = found.into();
        Self {
            message: format!("field '{}' should be {} but is {}", field, expected, found),
            field,
            kind: AnomalyKind::TypeMismatch { expected, found },
        }
    }

    /// Payload structure note
    pub fn structure(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: AnomalyKind::Structure,
            message: message.into(),
        }
    }
}

/// Attachment enumerated from a MIME message (never processed further)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    /// File name from Content-Disposition or Content-Type
    pub filename: String,
    /// MIME content type
    pub content_type: String,
}

/// Uniform output of every format agent
///
/// The shape is identical across formats; fields that do not apply keep
/// their empty defaults instead of being omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Format the agent processed; authoritative for callers
    pub format: Format,

    /// Sender address or name, when the format carries one
    pub sender: Option<String>,

    /// Subject line, when the format carries one
    pub subject: Option<String>,

    /// Text content (or base64 passthrough when text is unavailable)
    pub content: String,

    /// Urgency reading
    pub urgency: Urgency,

    /// Sentiment reading
    pub sentiment: Sentiment,

    /// Entities found in the content
    pub key_entities: Vec<KeyEntity>,

    /// Structured fields in canonical form
    pub fields: Map<String, Value>,

    /// Source data that could not be mapped to a canonical field
    pub extra: Map<String, Value>,

    /// Validation findings (never fatal)
    pub anomalies: Vec<ValidationAnomaly>,

    /// Enumerated attachments
    pub attachments: Vec<AttachmentInfo>,
}

impl ExtractionResult {
    /// Empty result for the given format
    ///
    /// # Examples
    ///
    /// ```
    /// use triage_domain::{ExtractionResult, Format, Urgency};
    ///
    /// let result = ExtractionResult::empty(Format::Unknown);
    /// assert!(result.content.is_empty());
    /// assert_eq!(result.urgency, Urgency::Unknown);
    /// assert!(result.sender.is_none());
    /// ```
    pub fn empty(format: Format) -> Self {
        Self {
            format,
            sender: None,
            subject: None,
            content: String::new(),
            urgency: Urgency::Unknown,
            sentiment: Sentiment::Unknown,
            key_entities: Vec::new(),
            fields: Map::new(),
            extra: Map::new(),
            anomalies: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Look up a canonical field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_result_serializes_every_field() {
        let value = serde_json::to_value(ExtractionResult::empty(Format::Json)).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "format", "sender", "subject", "content", "urgency", "sentiment",
            "key_entities", "fields", "extra", "anomalies", "attachments",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj["sender"], Value::Null);
        assert_eq!(obj["urgency"], json!("Unknown"));
    }

    #[test]
    fn test_anomaly_constructors() {
        let missing = ValidationAnomaly::missing("customer");
        assert_eq!(missing.kind, AnomalyKind::MissingField);
        assert!(missing.message.contains("customer"));

        let mismatch = ValidationAnomaly::type_mismatch("items", "array", "string");
        assert_eq!(
            mismatch.kind,
            AnomalyKind::TypeMismatch {
                expected: "array".to_string(),
                found: "string".to_string()
            }
        );
    }

    #[test]
    fn test_anomaly_kind_is_tagged() {
        let value = serde_json::to_value(ValidationAnomaly::missing("items")).unwrap();
        assert_eq!(value["kind"]["type"], json!("missing_field"));
    }
}
