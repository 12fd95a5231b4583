//! Parse LLM output into verdicts and field maps

use crate::LlmError;
use serde_json::Value;
use triage_domain::{CapabilityVerdict, FieldMap};

/// Parse an intent classification response
///
/// Expects an object with `intent` (or `label`) and `confidence`. The
/// label is returned verbatim; normalization is the caller's job.
pub fn parse_verdict(response: &str) -> Result<CapabilityVerdict, LlmError> {
    let obj = parse_object(response)?;

    let label = obj
        .get("intent")
        .or_else(|| obj.get("label"))
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::InvalidResponse("Missing or invalid 'intent'".to_string()))?
        .trim()
        .to_string();

    let confidence = obj
        .get("confidence")
        .and_then(number_like)
        .ok_or_else(|| LlmError::InvalidResponse("Missing or invalid 'confidence'".to_string()))?;

    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(CapabilityVerdict {
        label,
        confidence,
        reasoning,
    })
}

/// Parse a field extraction response into a map
///
/// Null values are dropped so that "not present" reads the same whether
/// the model omitted the key or sent `null`.
pub fn parse_fields(response: &str) -> Result<FieldMap, LlmError> {
    let mut obj = parse_object(response)?;
    obj.retain(|_, v| !v.is_null());
    Ok(obj)
}

fn parse_object(response: &str) -> Result<FieldMap, LlmError> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| LlmError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    match json {
        Value::Object(map) => Ok(map),
        _ => Err(LlmError::InvalidResponse("Expected JSON object".to_string())),
    }
}

/// Accept `0.8` as well as `"0.8"`
fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract the JSON object from a response
///
/// LLMs sometimes wrap JSON in markdown code blocks or surround it with
/// prose; this takes the outermost `{ ... }` span.
pub fn extract_json(response: &str) -> Result<&str, LlmError> {
    let trimmed = response.trim();

    let body = if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the language tag line and the closing fence
        let rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or("");
        rest.rsplit_once("```").map(|(b, _)| b).unwrap_or(rest)
    } else {
        trimmed
    };

    let start = body.find('{');
    let end = body.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&body[s..=e]),
        _ => Err(LlmError::InvalidResponse(
            "No JSON object in response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_verdict() {
        let verdict =
            parse_verdict(r#"{"intent": "Invoice", "confidence": 0.92, "reasoning": "bill"}"#)
                .unwrap();
        assert_eq!(verdict.label, "Invoice");
        assert_eq!(verdict.confidence, 0.92);
        assert_eq!(verdict.reasoning.as_deref(), Some("bill"));
    }

    #[test]
    fn test_parse_verdict_with_markdown_wrapper() {
        let response = "```json\n{\"intent\": \"RFQ\", \"confidence\": \"0.7\"}\n```";
        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.label, "RFQ");
        assert_eq!(verdict.confidence, 0.7);
    }

    #[test]
    fn test_parse_verdict_surrounded_by_prose() {
        let response = "Sure! Here you go: {\"label\": \"Complaint\", \"confidence\": 1} Hope it helps.";
        let verdict = parse_verdict(response).unwrap();
        assert_eq!(verdict.label, "Complaint");
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_parse_verdict_missing_confidence() {
        let result = parse_verdict(r#"{"intent": "Invoice"}"#);
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_verdict("This is not JSON").is_err());
        assert!(parse_verdict("{ not json }").is_err());
    }

    #[test]
    fn test_parse_fields_drops_nulls() {
        let fields =
            parse_fields(r#"{"invoice_number": "INV-1", "amount": 120.5, "vendor": null}"#)
                .unwrap();
        assert_eq!(fields.get("invoice_number"), Some(&json!("INV-1")));
        assert_eq!(fields.get("amount"), Some(&json!(120.5)));
        assert!(!fields.contains_key("vendor"));
    }

    #[test]
    fn test_parse_fields_rejects_array() {
        assert!(parse_fields("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_extract_json_from_plain_json() {
        let json = r#"{"key": "value"}"#;
        assert_eq!(extract_json(json).unwrap(), json);
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        let response = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json(response).unwrap(), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_empty_fence() {
        assert!(extract_json("```").is_err());
    }
}
