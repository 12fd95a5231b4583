//! Urgency scoring and sentiment lexicon

use std::collections::HashSet;
use triage_domain::{Sentiment, Urgency};

const CRITICAL_TERMS: &[&str] = &[
    "outage",
    "emergency",
    "breach",
    "critical",
    "security incident",
    "is down",
    "are down",
    "went down",
    "site down",
    "system down",
    "server down",
];
const HIGH_TERMS: &[&str] = &["urgent", "asap", "immediately", "rush", "escalate", "deadline today"];
const MEDIUM_TERMS: &[&str] = &["soon", "quickly", "priority", "follow up", "reminder"];

const CRITICAL_WEIGHT: u32 = 4;
const HIGH_WEIGHT: u32 = 3;
const MEDIUM_WEIGHT: u32 = 1;
const SUBJECT_MULTIPLIER: u32 = 2;

const POSITIVE_TERMS: &[&str] = &[
    "thank", "thanks", "great", "excellent", "appreciate", "appreciated", "happy", "pleased",
    "satisfied", "wonderful", "good", "love", "perfect",
];
const NEGATIVE_TERMS: &[&str] = &[
    "complaint", "angry", "disappointed", "unacceptable", "terrible", "awful", "poor", "bad",
    "frustrated", "broken", "refund", "worst", "outage", "problem", "issue", "failed", "unhappy",
];

/// Lowercased word set plus the word sequence for phrase lookups
///
/// Phrases match whole words only: "is down" does not match "this down".
struct Terms {
    sequence: String,
    words: HashSet<String>,
}

impl Terms {
    fn new(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let ordered: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let sequence = format!(" {} ", ordered.join(" "));
        let words = ordered.into_iter().map(str::to_string).collect();
        Self { sequence, words }
    }

    fn count(&self, terms: &[&str]) -> u32 {
        terms
            .iter()
            .filter(|t| {
                if t.contains(' ') {
                    self.sequence.contains(&format!(" {} ", t))
                } else {
                    self.words.contains(**t)
                }
            })
            .count() as u32
    }

    fn score(&self) -> u32 {
        self.count(CRITICAL_TERMS) * CRITICAL_WEIGHT
            + self.count(HIGH_TERMS) * HIGH_WEIGHT
            + self.count(MEDIUM_TERMS) * MEDIUM_WEIGHT
    }
}

/// Keyword urgency score; subject terms count double
pub fn urgency_score(subject: &str, body: &str) -> u32 {
    Terms::new(subject).score() * SUBJECT_MULTIPLIER + Terms::new(body).score()
}

/// Map a score onto an urgency band
pub fn urgency_band(score: u32) -> Urgency {
    match score {
        0 => Urgency::Low,
        1..=2 => Urgency::Medium,
        3..=5 => Urgency::High,
        _ => Urgency::Critical,
    }
}

/// Urgency from subject and body keywords
///
/// # Examples
///
/// ```
/// use triage_agents::signals::keyword_urgency;
/// use triage_domain::Urgency;
///
/// assert_eq!(keyword_urgency("Weekly digest", "Nothing new."), Urgency::Low);
/// assert_eq!(keyword_urgency("Question", "Please reply immediately."), Urgency::High);
/// ```
pub fn keyword_urgency(subject: &str, body: &str) -> Urgency {
    urgency_band(urgency_score(subject, body))
}

/// Lexicon sentiment: positive hits minus negative hits, counted per occurrence
pub fn lexicon_sentiment(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    let mut balance: i64 = 0;
    for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        if POSITIVE_TERMS.contains(&word) {
            balance += 1;
        } else if NEGATIVE_TERMS.contains(&word) {
            balance -= 1;
        }
    }

    match balance {
        b if b > 0 => Sentiment::Positive,
        b if b < 0 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}
