//! Regex-based key entity extraction

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use triage_domain::{EntityKind, KeyEntity};

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}|\d{1,2}\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{4})\b",
    )
    .expect("date pattern")
});

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z]{2,6}-\d[A-Z0-9-]*\b|#\d{3,}\b").expect("reference pattern")
});

static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[$€£]\s?\d[\d,]*(?:\.\d{1,2})?|\b\d[\d,]*(?:\.\d{1,2})?\s?(?:USD|EUR|GBP)\b")
        .expect("amount pattern")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern")
});

static PROPER_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+\b").expect("proper noun pattern")
});

/// Capitalised words that start sentences or greetings rather than names
const LEADING_STOPWORDS: &[&str] = &[
    "Dear", "Hi", "Hello", "The", "Thanks", "Thank", "Best", "Kind", "Regards", "Please", "From",
    "To", "Subject", "Re", "Fwd", "Our", "Your", "We", "This",
];

/// Find dates, references, amounts, addresses and proper-noun sequences
///
/// Entities are deduplicated and reported in kind order, then text order,
/// up to `limit`.
pub fn extract_entities(text: &str, limit: usize) -> Vec<KeyEntity> {
    let mut seen: HashSet<(EntityKind, String)> = HashSet::new();
    let mut entities = Vec::new();

    let mut push = |kind: EntityKind, value: &str| {
        let value = value.trim();
        if value.is_empty() || entities.len() >= limit {
            return;
        }
        if seen.insert((kind, value.to_string())) {
            entities.push(KeyEntity::new(kind, value));
        }
    };

    for m in DATE.find_iter(text) {
        push(EntityKind::Date, m.as_str());
    }
    for m in REFERENCE.find_iter(text) {
        push(EntityKind::Reference, m.as_str());
    }
    for m in AMOUNT.find_iter(text) {
        push(EntityKind::Amount, m.as_str());
    }
    for m in EMAIL.find_iter(text) {
        push(EntityKind::EmailAddress, m.as_str());
    }
    for m in PROPER_NOUN.find_iter(text) {
        if let Some(name) = strip_stopword(m.as_str()) {
            push(EntityKind::ProperNoun, &name);
        }
    }

    entities
}

/// Drop a leading greeting word; keep only multi-word names
fn strip_stopword(sequence: &str) -> Option<String> {
    let words: Vec<&str> = sequence.split_whitespace().collect();
    let start = usize::from(LEADING_STOPWORDS.contains(&words[0]));
    if words.len() - start < 2 {
        return None;
    }
    Some(words[start..].join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(entities: &[KeyEntity], kind: EntityKind) -> Vec<String> {
        entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.value.clone())
            .collect()
    }

    #[test]
    fn test_dates() {
        let found = extract_entities("Due 2024-03-15, shipped 03/01/2024 and March 3, 2024.", 50);
        assert_eq!(
            values(&found, EntityKind::Date),
            vec!["2024-03-15", "03/01/2024", "March 3, 2024"]
        );
    }

    #[test]
    fn test_references_and_amounts() {
        let found = extract_entities("Invoice INV-2024-001 for $1,250.00, ticket #48213, 300 EUR", 50);
        assert_eq!(values(&found, EntityKind::Reference), vec!["INV-2024-001", "#48213"]);
        assert_eq!(values(&found, EntityKind::Amount), vec!["$1,250.00", "300 EUR"]);
    }

    #[test]
    fn test_email_addresses() {
        let found = extract_entities("Contact jane.doe@example.com or ops@acme.io", 50);
        assert_eq!(
            values(&found, EntityKind::EmailAddress),
            vec!["jane.doe@example.com", "ops@acme.io"]
        );
    }

    #[test]
    fn test_proper_nouns_drop_greetings() {
        let found = extract_entities("Dear John Smith,\nI met Acme Industries yesterday.", 50);
        assert_eq!(
            values(&found, EntityKind::ProperNoun),
            vec!["John Smith", "Acme Industries"]
        );
    }

    #[test]
    fn test_single_capitalised_word_is_not_a_name() {
        let found = extract_entities("Hello Bob, thanks.", 50);
        assert!(values(&found, EntityKind::ProperNoun).is_empty());
    }

    #[test]
    fn test_deduplicated_and_limited() {
        let found = extract_entities("PO-11 PO-11 PO-12 PO-13", 2);
        assert_eq!(values(&found, EntityKind::Reference), vec!["PO-11", "PO-12"]);
    }
}
