//! PDF agent

use crate::agent::{AgentOutcome, AgentRequest};
use crate::config::{truncate_chars, AgentConfig};
use crate::entities::extract_entities;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use triage_domain::{
    ExtractionResult, Format, Intent, LanguageCapability, RawInput, StageMarker,
};

static INVOICE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)invoice\s*(?:number|no\.?|#)?\s*[:#]?\s*([A-Z0-9-]*\d[A-Z0-9-]*)")
        .expect("invoice number pattern")
});
static TOTAL_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:total|amount(?:\s+due)?)\s*:?\s*(?:[A-Z]{3}\s*)?[$€£]?\s*(\d[\d,]*(?:\.\d{1,2})?)")
        .expect("total amount pattern")
});
static DOLLAR_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d[\d,]*(?:\.\d{1,2})?)").expect("dollar amount pattern"));
static DOCUMENT_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdate\s*:?\s*(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}|[A-Z][a-z]+ \d{1,2},? \d{4})")
        .expect("document date pattern")
});
static RFQ_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bRFQ\s*(?:number|no\.?|#)?\s*[:#]?\s*([A-Z0-9-]*\d[A-Z0-9-]*)")
        .expect("rfq number pattern")
});
static DEADLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:deadline|due\s+by|respond\s+by)\s*:?\s*(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}|[A-Z][a-z]+ \d{1,2},? \d{4})")
        .expect("deadline pattern")
});
static CASE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:case|ticket)\s*(?:number|no\.?|#)?\s*[:#]?\s*([A-Z0-9-]*\d[A-Z0-9-]*)")
        .expect("case number pattern")
});
static ORDER_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:order|PO)\s*(?:number|no\.?|#)?\s*[:#]?\s*([A-Z0-9-]*\d[A-Z0-9-]*)")
        .expect("order number pattern")
});

/// Extracts text and intent-specific fields from PDF documents
pub struct PdfAgent {
    capability: Arc<dyn LanguageCapability>,
    config: AgentConfig,
}

impl PdfAgent {
    /// Create a PDF agent backed by a language capability
    pub fn new(capability: Arc<dyn LanguageCapability>, config: AgentConfig) -> Self {
        Self { capability, config }
    }

    pub(crate) fn preview(&self, input: &RawInput) -> String {
        pdf_bytes(input)
            .and_then(|bytes| extract_text(&bytes))
            .unwrap_or_default()
    }

    pub(crate) async fn process(&self, request: &AgentRequest<'_>) -> AgentOutcome {
        let mut result = ExtractionResult::empty(request.format);
        let text = request.text.trim();

        if text.is_empty() {
            // Keep the document itself so nothing is lost
            let bytes = pdf_bytes(request.input).unwrap_or_else(|| request.input.bytes.clone());
            result.content = STANDARD.encode(&bytes);
            warn!(
                "No text layer in PDF for thread {}; storing base64 document",
                request.thread_id
            );
            let mut outcome = AgentOutcome::new(result)
                .with_detail(format!("no text extracted; {} bytes kept as base64", bytes.len()));
            outcome.mark(StageMarker::TextExtractionDegraded);
            return outcome;
        }

        result.content = truncate_chars(text, self.config.max_content_chars).to_string();
        result.key_entities = extract_entities(text, self.config.max_entities);

        let mut outcome_markers = Vec::new();
        let source = if self.config.capability_fields {
            match self
                .capability
                .extract_fields(text, request.intent, Format::Pdf)
                .await
            {
                Ok(fields) if !fields.is_empty() => {
                    result.fields = fields;
                    self.capability.name().to_string()
                }
                Ok(_) => {
                    debug!("Capability returned no PDF fields; using patterns");
                    result.fields = fallback_fields(request.intent, text);
                    outcome_markers.push(StageMarker::FallbackUsed);
                    "patterns".to_string()
                }
                Err(e) => {
                    warn!("PDF field extraction failed ({}); using patterns", e);
                    result.fields = fallback_fields(request.intent, text);
                    outcome_markers.push(StageMarker::FallbackUsed);
                    "patterns".to_string()
                }
            }
        } else {
            result.fields = fallback_fields(request.intent, text);
            "patterns".to_string()
        };

        let detail = format!(
            "{} chars of text, {} fields via {}, {} entities",
            text.chars().count(),
            result.fields.len(),
            source,
            result.key_entities.len()
        );
        let mut outcome = AgentOutcome::new(result).with_detail(detail);
        for marker in outcome_markers {
            outcome.mark(marker);
        }
        outcome
    }
}

/// Raw PDF bytes from the signature on, decoding a base64 transport when needed
///
/// Junk before the signature (line breaks, a BOM) is dropped so the parser
/// sees the document header first.
pub fn pdf_bytes(input: &RawInput) -> Option<Vec<u8>> {
    if let Some(document) = input.pdf_slice() {
        return Some(document.to_vec());
    }

    let text = input.as_text()?.trim();
    let payload = match text.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data)?,
        None => text,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = RawInput::new(STANDARD.decode(compact.as_bytes()).ok()?);
    decoded.pdf_slice().map(<[u8]>::to_vec)
}

/// Text of every page joined in page order; None when the document cannot be read
pub fn extract_text(bytes: &[u8]) -> Option<String> {
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Unreadable PDF: {}", e);
            return None;
        }
    };
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Some(String::new());
    }
    match doc.extract_text(&pages) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("PDF text extraction failed: {}", e);
            None
        }
    }
}

/// Pattern-based fields for the intents that carry identifiable numbers
///
/// Fields whose pattern does not match are omitted.
pub fn fallback_fields(intent: Intent, text: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    let mut capture = |name: &str, pattern: &Regex| {
        if let Some(value) = first_capture(pattern, text) {
            fields.insert(name.to_string(), Value::String(value));
        }
    };

    match intent {
        Intent::Invoice => {
            capture("invoice_number", &INVOICE_NUMBER);
            capture("date", &DOCUMENT_DATE);
        }
        Intent::Rfq => {
            capture("rfq_number", &RFQ_NUMBER);
            capture("deadline", &DEADLINE);
        }
        Intent::Complaint => capture("case_number", &CASE_NUMBER),
        Intent::Order => capture("order_id", &ORDER_NUMBER),
        _ => {}
    }

    if intent == Intent::Invoice {
        let amount = first_capture(&TOTAL_AMOUNT, text)
            .or_else(|| first_capture(&DOLLAR_AMOUNT, text))
            .and_then(|raw| raw.replace(',', "").parse::<f64>().ok())
            .and_then(serde_json::Number::from_f64);
        if let Some(amount) = amount {
            fields.insert("amount".to_string(), Value::Number(amount));
        }
    }

    fields
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoice_patterns() {
        let text = "ACME Corp\nInvoice Number: INV-2024-001\nDate: 2024-03-01\nTotal: $1,250.50";
        let fields = fallback_fields(Intent::Invoice, text);
        assert_eq!(fields.get("invoice_number"), Some(&json!("INV-2024-001")));
        assert_eq!(fields.get("date"), Some(&json!("2024-03-01")));
        assert_eq!(fields.get("amount"), Some(&json!(1250.5)));
    }

    #[test]
    fn test_amount_falls_back_to_dollar_figure() {
        let fields = fallback_fields(Intent::Invoice, "Invoice #7781 for services: $300");
        assert_eq!(fields.get("invoice_number"), Some(&json!("7781")));
        assert_eq!(fields.get("amount"), Some(&json!(300.0)));
    }

    #[test]
    fn test_missing_fields_omitted() {
        let fields = fallback_fields(Intent::Invoice, "Nothing to see here");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_rfq_patterns() {
        let text = "RFQ No. RFQ-88 for steel pipe. Deadline: 2024-05-30";
        let fields = fallback_fields(Intent::Rfq, text);
        assert_eq!(fields.get("rfq_number"), Some(&json!("RFQ-88")));
        assert_eq!(fields.get("deadline"), Some(&json!("2024-05-30")));
    }

    #[test]
    fn test_other_intents() {
        let fields = fallback_fields(Intent::Complaint, "Re: case #55120");
        assert_eq!(fields.get("case_number"), Some(&json!("55120")));
        assert!(fallback_fields(Intent::GeneralInquiry, "Order 42").is_empty());
    }

    #[test]
    fn test_base64_transport_decoded() {
        let encoded = STANDARD.encode(b"%PDF-1.4 body");
        let input = RawInput::from(format!("data:application/pdf;base64,{}", encoded));
        assert_eq!(pdf_bytes(&input).unwrap(), b"%PDF-1.4 body".to_vec());
        assert!(pdf_bytes(&RawInput::from("hello")).is_none());
    }

    #[test]
    fn test_leading_junk_dropped() {
        let input = RawInput::new(b"\r\n%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec());
        assert_eq!(pdf_bytes(&input).unwrap(), b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec());
    }

    #[test]
    fn test_unreadable_pdf() {
        let text = extract_text(b"%PDF-1.4 garbage");
        assert!(text.map_or(true, |t| t.trim().is_empty()));
    }
}
