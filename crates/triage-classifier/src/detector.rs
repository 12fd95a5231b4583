//! Structural format sniffing
//!
//! Checks run in a fixed order and the first confident match wins:
//! PDF signature, base64-wrapped PDF, strict JSON, RFC-822 headers.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use triage_domain::{Format, RawInput, PDF_SIGNATURE, PDF_WINDOW};

const HEADER_WINDOW: usize = 4096;

/// Base64 characters needed to cover the PDF magic
const BASE64_PROBE: usize = 12;

const PDF_CONFIDENCE: f64 = 0.95;
const BASE64_PDF_CONFIDENCE: f64 = 0.90;
const JSON_CONFIDENCE: f64 = 0.95;
const EMAIL_BASE: f64 = 0.6;
const EMAIL_STEP: f64 = 0.1;
const EMAIL_CEILING: f64 = 0.95;

const HINT_BONUS: f64 = 0.04;
const HINT_CEILING: f64 = 0.99;

/// Headers counted towards email confidence
const CANONICAL_HEADERS: [&str; 9] = [
    "from",
    "to",
    "subject",
    "date",
    "cc",
    "reply-to",
    "message-id",
    "mime-version",
    "content-type",
];

/// At least one of these must be present for an email match
const REQUIRED_HEADERS: [&str; 3] = ["from", "to", "subject"];

/// What matched during detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionSignal {
    /// `%PDF-` near the start of the input
    PdfSignature,
    /// Base64 body decoding to a PDF signature
    Base64Pdf,
    /// Whole input parsed as JSON
    JsonParse,
    /// RFC-822 header block, with the number of canonical headers seen
    EmailHeaders(usize),
    /// Empty or whitespace-only input
    Blank,
    /// Nothing matched
    NoMatch,
}

impl fmt::Display for DetectionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionSignal::PdfSignature => f.write_str("pdf signature"),
            DetectionSignal::Base64Pdf => f.write_str("base64 pdf"),
            DetectionSignal::JsonParse => f.write_str("strict json parse"),
            DetectionSignal::EmailHeaders(n) => write!(f, "{} email headers", n),
            DetectionSignal::Blank => f.write_str("blank input"),
            DetectionSignal::NoMatch => f.write_str("no signal"),
        }
    }
}

/// Detector output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Assigned format
    pub format: Format,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// The check that decided the format
    pub signal: DetectionSignal,
    /// Whether the filename hint agreed and raised confidence
    pub hint_applied: bool,
}

impl Detection {
    fn new(format: Format, confidence: f64, signal: DetectionSignal) -> Self {
        Self {
            format,
            confidence,
            signal,
            hint_applied: false,
        }
    }

    fn unknown(signal: DetectionSignal) -> Self {
        Self::new(Format::Unknown, 0.0, signal)
    }

    /// One-line description for the chain record
    pub fn describe(&self) -> String {
        let mut line = format!(
            "{} via {} (confidence {:.2})",
            self.format, self.signal, self.confidence
        );
        if self.hint_applied {
            line.push_str(", filename hint agreed");
        }
        line
    }
}

/// Assigns a [`Format`] to raw input
///
/// # Examples
///
/// ```
/// use triage_classifier::FormatDetector;
/// use triage_domain::{Format, RawInput, PDF_SIGNATURE, PDF_WINDOW};
///
/// let detector = FormatDetector::new();
/// let detection = detector.detect(&RawInput::from(r#"{"order_id": 1}"#));
/// assert_eq!(detection.format, Format::Json);
/// assert!(detection.confidence >= 0.9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDetector;

impl FormatDetector {
    /// Create a detector
    pub fn new() -> Self {
        Self
    }

    /// Detect the format of `input`, using its filename only as a tie-breaker hint
    pub fn detect(&self, input: &RawInput) -> Detection {
        if input.is_blank() {
            return Detection::unknown(DetectionSignal::Blank);
        }

        let detection = Self::sniff(input);
        match input.filename.as_deref() {
            Some(name) => Self::apply_hint(detection, name),
            None => detection,
        }
    }

    fn sniff(input: &RawInput) -> Detection {
        let bytes = input.bytes.as_slice();
        if input.pdf_offset().is_some() {
            return Detection::new(Format::Pdf, PDF_CONFIDENCE, DetectionSignal::PdfSignature);
        }
        if is_base64_pdf(bytes) {
            return Detection::new(
                Format::Pdf,
                BASE64_PDF_CONFIDENCE,
                DetectionSignal::Base64Pdf,
            );
        }
        if serde_json::from_slice::<serde_json::Value>(bytes).is_ok() {
            return Detection::new(Format::Json, JSON_CONFIDENCE, DetectionSignal::JsonParse);
        }
        if let Some(count) = email_header_count(bytes) {
            let confidence = (EMAIL_BASE + EMAIL_STEP * (count - 1) as f64).min(EMAIL_CEILING);
            return Detection::new(Format::Email, confidence, DetectionSignal::EmailHeaders(count));
        }
        Detection::unknown(DetectionSignal::NoMatch)
    }

    /// Raise confidence when the filename extension agrees; never changes the format
    fn apply_hint(mut detection: Detection, filename: &str) -> Detection {
        if detection.format == Format::Unknown {
            return detection;
        }
        if Format::from_extension(filename) != Some(detection.format) {
            return detection;
        }

        let ceiling = match detection.format {
            Format::Email => EMAIL_CEILING,
            _ => HINT_CEILING,
        };
        let raised = (detection.confidence + HINT_BONUS).min(ceiling);
        if raised > detection.confidence {
            detection.confidence = raised;
            detection.hint_applied = true;
        }
        detection
    }
}

/// Strip an optional data-URL prefix and whitespace, then decode the head
fn is_base64_pdf(bytes: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(&bytes[..bytes.len().min(PDF_WINDOW)]) else {
        return false;
    };
    let text = text.trim_start();
    let body = match text.find("base64,") {
        Some(pos) if text.starts_with("data:") => &text[pos + "base64,".len()..],
        _ => text,
    };

    let probe: String = body
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .take(BASE64_PROBE)
        .collect();
    if probe.len() < BASE64_PROBE {
        return false;
    }

    STANDARD
        .decode(probe.as_bytes())
        .map(|decoded| decoded.starts_with(PDF_SIGNATURE))
        .unwrap_or(false)
}

/// Count distinct canonical headers in the leading window
///
/// Returns `None` unless at least one of From, To, Subject is present.
fn email_header_count(bytes: &[u8]) -> Option<usize> {
    let window = String::from_utf8_lossy(&bytes[..bytes.len().min(HEADER_WINDOW)]);

    let mut seen: Vec<&str> = Vec::new();
    for line in window.lines() {
        let Some((name, _)) = line.split_once(':') else {
            continue;
        };
        // Header names carry no leading whitespace (that would be a fold)
        if name.is_empty() || name.starts_with(char::is_whitespace) {
            continue;
        }
        let name = name.trim_end().to_ascii_lowercase();
        if let Some(&header) = CANONICAL_HEADERS.iter().find(|h| **h == name) {
            if !seen.contains(&header) {
                seen.push(header);
            }
        }
    }

    if seen.iter().any(|h| REQUIRED_HEADERS.contains(h)) {
        Some(seen.len())
    } else {
        None
    }
}
