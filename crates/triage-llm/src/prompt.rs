//! Constrained prompts for intent classification and field extraction

use triage_domain::{Format, Intent};

/// Default cap on document text included in a prompt
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 2000;

/// Builds prompts sent to the provider
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_chars: usize,
}

impl PromptBuilder {
    /// Create a builder that truncates document text to `max_chars`
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// Build the intent classification prompt
    pub fn intent(&self, text: &str, labels: &[Intent]) -> String {
        let names: Vec<&str> = labels.iter().map(Intent::as_str).collect();

        let mut prompt = String::new();
        prompt.push_str(INTENT_INSTRUCTIONS);
        prompt.push_str("\n\nAllowed labels: ");
        prompt.push_str(&names.join(", "));
        prompt.push_str("\n\nText to classify:\n---\n");
        prompt.push_str(truncate(text, self.max_chars));
        prompt.push_str("\n---\n\n");
        prompt.push_str(INTENT_OUTPUT_FORMAT);
        prompt
    }

    /// Build the field extraction prompt for a document of the given intent
    pub fn fields(&self, text: &str, intent: Intent, format: Format) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!(
            "Extract structured fields from this {} document ({} intent).\n\n",
            format.as_str(),
            intent.as_str()
        ));
        prompt.push_str("Fields to look for:\n");
        for field in field_hints(intent) {
            prompt.push_str(&format!("- {}\n", field));
        }
        prompt.push_str("\nDocument:\n---\n");
        prompt.push_str(truncate(text, self.max_chars));
        prompt.push_str("\n---\n\n");
        prompt.push_str(FIELDS_OUTPUT_FORMAT);
        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROMPT_CHARS)
    }
}

/// Field names worth asking for, per intent
pub fn field_hints(intent: Intent) -> &'static [&'static str] {
    match intent {
        Intent::Invoice => &["invoice_number", "amount", "date", "vendor", "due_date"],
        Intent::Rfq => &["rfq_number", "items", "quantities", "deadline", "requester"],
        Intent::Complaint => &["case_number", "complainant", "issue", "product"],
        Intent::Regulation => &["regulation_id", "authority", "effective_date", "requirements"],
        Intent::Order => &["order_id", "customer", "items", "total"],
        Intent::Inventory => &["sku", "quantity", "location", "warehouse"],
        Intent::GeneralInquiry | Intent::Unknown => &["sender", "topic", "request", "urgency", "sentiment"],
    }
}

/// Truncate on a char boundary
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

const INTENT_INSTRUCTIONS: &str = r#"Classify the business intent of the following document.

Guidelines:
- "RFQ" for requests for quotation, procurement requests, product inquiries
- "Complaint" for service issues, dissatisfaction, problems
- "Invoice" for billing documents, payment requests, financial statements
- "Regulation" for compliance, policy, regulatory documents
- "Order" for purchase orders and order confirmations
- "Inventory" for stock levels and warehouse reports
- "General Inquiry" for questions and general information requests
- "Unknown" when none of the above applies

Choose exactly one label from the allowed list. Report how sure you are as
a confidence between 0.0 and 1.0."#;

const INTENT_OUTPUT_FORMAT: &str = r#"Output format (JSON object only, no additional text):
{
  "intent": "one label exactly as listed",
  "confidence": 0.0-1.0,
  "reasoning": "brief explanation"
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

const FIELDS_OUTPUT_FORMAT: &str = r#"Output format (JSON object only, no additional text):
{
  "field_name": "value"
}

Use snake_case keys. Omit fields that are not present. Numbers must be JSON
numbers without currency symbols.

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_prompt_lists_labels() {
        let prompt = PromptBuilder::default().intent("Please pay invoice 7", &Intent::ALL);
        assert!(prompt.contains("Allowed labels: Invoice, RFQ, Complaint"));
        assert!(prompt.contains("General Inquiry"));
        assert!(prompt.contains("Please pay invoice 7"));
        assert!(prompt.contains("\"confidence\""));
    }

    #[test]
    fn test_fields_prompt_uses_intent_hints() {
        let prompt = PromptBuilder::default().fields("text", Intent::Invoice, Format::Pdf);
        assert!(prompt.contains("PDF document (Invoice intent)"));
        assert!(prompt.contains("- invoice_number"));
        assert!(prompt.contains("- vendor"));
        assert!(!prompt.contains("rfq_number"));
    }

    #[test]
    fn test_text_truncated_to_limit() {
        let text = "é".repeat(50);
        let prompt = PromptBuilder::new(10).intent(&text, &[Intent::Unknown]);
        assert!(prompt.contains(&"é".repeat(10)));
        assert!(!prompt.contains(&"é".repeat(11)));
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("abcdef", 3), "abc");
    }
}
