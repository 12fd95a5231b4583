//! Deterministic keyword heuristic used when the capability cannot decide

use std::collections::HashSet;
use triage_domain::Intent;

/// Keyword lists in priority order; earlier entries win ties
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Complaint,
        &[
            "complaint",
            "complain",
            "dissatisfied",
            "disappointed",
            "problem",
            "issue",
            "error",
            "wrong",
            "terrible",
            "awful",
            "unacceptable",
            "refund",
            "broken",
            "outage",
        ],
    ),
    (
        Intent::Rfq,
        &[
            "quote",
            "quotation",
            "rfq",
            "pricing",
            "purchase",
            "buy",
            "cost",
            "request for quotation",
            "price list",
        ],
    ),
    (
        Intent::Invoice,
        &[
            "invoice",
            "bill",
            "billing",
            "payment",
            "charge",
            "amount due",
            "total",
            "due",
            "paid",
            "remit",
        ],
    ),
    (
        Intent::Regulation,
        &[
            "regulation",
            "regulatory",
            "compliance",
            "policy",
            "rule",
            "law",
            "requirement",
            "gdpr",
            "audit",
        ],
    ),
    (
        Intent::Order,
        &[
            "order",
            "order_id",
            "purchase order",
            "ship to",
            "shipping",
            "delivery",
            "quantity",
        ],
    ),
    (
        Intent::Inventory,
        &[
            "inventory",
            "stock",
            "warehouse",
            "sku",
            "on hand",
            "reorder",
        ],
    ),
    (
        Intent::GeneralInquiry,
        &[
            "question",
            "information",
            "inquiry",
            "wondering",
            "could you",
            "help",
        ],
    ),
];

const BASE_CONFIDENCE: f64 = 0.3;
const PER_HIT: f64 = 0.1;

/// Result of a keyword match
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicMatch {
    /// Best-scoring intent
    pub intent: Intent,
    /// `0.3 + 0.1 * hits`, capped by the caller's ceiling
    pub confidence: f64,
    /// Keywords that matched, in list order
    pub matched: Vec<&'static str>,
}

/// Keyword scorer over lowercased text
#[derive(Debug, Clone)]
pub struct KeywordHeuristic {
    ceiling: f64,
}

impl KeywordHeuristic {
    /// Create a heuristic whose confidence never exceeds `ceiling`
    pub fn new(ceiling: f64) -> Self {
        Self {
            ceiling: ceiling.clamp(0.0, 1.0),
        }
    }

    /// Score `text` against every intent; `None` when nothing matches
    pub fn classify(&self, text: &str) -> Option<HeuristicMatch> {
        let lowered = text.to_lowercase();
        let words: HashSet<&str> = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .collect();

        let mut best: Option<HeuristicMatch> = None;
        for (intent, keywords) in INTENT_KEYWORDS {
            let matched: Vec<&'static str> = keywords
                .iter()
                .copied()
                .filter(|kw| {
                    if kw.contains(' ') {
                        lowered.contains(kw)
                    } else {
                        words.contains(kw)
                    }
                })
                .collect();

            if matched.is_empty() {
                continue;
            }
            // Strictly greater keeps the earlier intent on ties
            if best.as_ref().map_or(true, |b| matched.len() > b.matched.len()) {
                best = Some(HeuristicMatch {
                    intent: *intent,
                    confidence: 0.0,
                    matched,
                });
            }
        }

        best.map(|mut m| {
            m.confidence = (BASE_CONFIDENCE + PER_HIT * m.matched.len() as f64).min(self.ceiling);
            m
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic() -> KeywordHeuristic {
        KeywordHeuristic::new(0.6)
    }

    #[test]
    fn test_no_keywords() {
        assert!(heuristic().classify("lorem ipsum dolor sit amet").is_none());
        assert!(heuristic().classify("").is_none());
    }

    #[test]
    fn test_single_hit_confidence() {
        let m = heuristic().classify("Please find the attached invoice.").unwrap();
        assert_eq!(m.intent, Intent::Invoice);
        assert!((m.confidence - 0.4).abs() < 1e-9);
        assert_eq!(m.matched, vec!["invoice"]);
    }

    #[test]
    fn test_confidence_capped_at_ceiling() {
        let m = heuristic()
            .classify("Terrible, unacceptable problem. I want a refund, this is wrong and broken.")
            .unwrap();
        assert_eq!(m.intent, Intent::Complaint);
        assert!((m.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_whole_words_only() {
        // "billion" must not count as "bill", "lawn" not as "law"
        assert!(heuristic().classify("a billion blades of lawn").is_none());
    }

    #[test]
    fn test_phrases_match_as_substrings() {
        let m = heuristic().classify("Current stock on hand in the warehouse").unwrap();
        assert_eq!(m.intent, Intent::Inventory);
        assert_eq!(m.matched, vec!["stock", "warehouse", "on hand"]);
    }

    #[test]
    fn test_more_hits_win() {
        let m = heuristic()
            .classify("Invoice for payment: total amount due, paid by wire. One issue.")
            .unwrap();
        assert_eq!(m.intent, Intent::Invoice);
    }

    #[test]
    fn test_ties_go_to_earlier_intent() {
        let m = heuristic().classify("complaint about the invoice").unwrap();
        assert_eq!(m.intent, Intent::Complaint);
    }

    #[test]
    fn test_ceiling_clamped() {
        let m = KeywordHeuristic::new(7.0).classify("invoice").unwrap();
        assert!(m.confidence <= 1.0);
    }
}
