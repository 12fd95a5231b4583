//! Closed label sets assigned by the pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural kind of a submitted document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// PDF document (raw or base64-wrapped)
    #[serde(rename = "PDF")]
    Pdf,

    /// JSON document
    #[serde(rename = "JSON")]
    Json,

    /// RFC-822 / MIME message
    #[serde(rename = "Email")]
    Email,

    /// Nothing recognizable
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Format {
    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Pdf => "PDF",
            Format::Json => "JSON",
            Format::Email => "Email",
            Format::Unknown => "Unknown",
        }
    }

    /// Parse a format from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Some(Format::Pdf),
            "json" => Some(Format::Json),
            "email" | "eml" | "mime" => Some(Format::Email),
            "unknown" => Some(Format::Unknown),
            _ => None,
        }
    }

    /// Guess a format from a filename extension
    ///
    /// Used only as a confidence hint; content sniffing always wins.
    pub fn from_extension(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Format::Pdf),
            "json" => Some(Format::Json),
            "eml" | "msg" | "mbox" => Some(Format::Email),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic purpose of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Bill or payment request
    Invoice,

    /// Request for quotation
    #[serde(rename = "RFQ")]
    Rfq,

    /// Customer complaint
    Complaint,

    /// Regulatory or compliance notice
    Regulation,

    /// Purchase order
    Order,

    /// Stock or inventory report
    Inventory,

    /// Anything else a human should read
    #[serde(rename = "General Inquiry")]
    GeneralInquiry,

    /// No label could be assigned
    Unknown,
}

impl Intent {
    /// Every label the classifier may assign, in prompt order
    pub const ALL: [Intent; 8] = [
        Intent::Invoice,
        Intent::Rfq,
        Intent::Complaint,
        Intent::Regulation,
        Intent::Order,
        Intent::Inventory,
        Intent::GeneralInquiry,
        Intent::Unknown,
    ];

    /// Get the display label
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Invoice => "Invoice",
            Intent::Rfq => "RFQ",
            Intent::Complaint => "Complaint",
            Intent::Regulation => "Regulation",
            Intent::Order => "Order",
            Intent::Inventory => "Inventory",
            Intent::GeneralInquiry => "General Inquiry",
            Intent::Unknown => "Unknown",
        }
    }

    /// Resolve a free-form label into a known intent
    ///
    /// Matching ignores case, whitespace and punctuation, so `"rfq"`,
    /// `"General_Inquiry"` and `"general inquiry"` all resolve. Returns
    /// `None` for labels outside the known set.
    ///
    /// # Examples
    ///
    /// ```
    /// use triage_domain::Intent;
    ///
    /// assert_eq!(Intent::from_label("invoice"), Some(Intent::Invoice));
    /// assert_eq!(Intent::from_label("Request for Quote"), Some(Intent::Rfq));
    /// assert_eq!(Intent::from_label("horoscope"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "invoice" | "bill" => Some(Intent::Invoice),
            "rfq" | "requestforquote" | "requestforquotation" | "quote" | "quotation" => {
                Some(Intent::Rfq)
            }
            "complaint" => Some(Intent::Complaint),
            "regulation" | "compliance" => Some(Intent::Regulation),
            "order" | "purchaseorder" => Some(Intent::Order),
            "inventory" | "stock" => Some(Intent::Inventory),
            "generalinquiry" | "inquiry" | "general" => Some(Intent::GeneralInquiry),
            "unknown" => Some(Intent::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How quickly a document needs attention
///
/// Ordered so that `max` picks the more urgent of two readings;
/// `Unknown` sorts below every real level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// Not applicable or not determined
    Unknown,
    /// Routine
    Low,
    /// Should be handled soon
    Medium,
    /// Needs prompt action
    High,
    /// Outage, breach or similar
    Critical,
}

impl Urgency {
    /// Parse an urgency level from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" | "normal" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            "critical" => Some(Urgency::Critical),
            "unknown" => Some(Urgency::Unknown),
            _ => None,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Unknown => "unknown",
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Unknown
    }
}

/// Emotional tone of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    /// Favourable tone
    Positive,
    /// Unfavourable tone
    Negative,
    /// Neither
    Neutral,
    /// Not applicable or not determined
    Unknown,
}

impl Sentiment {
    /// Parse a sentiment from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            "unknown" => Some(Sentiment::Unknown),
            _ => None,
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Sentiment::Unknown
    }
}
