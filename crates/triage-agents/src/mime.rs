//! Minimal RFC-822 / MIME reader
//!
//! Enough structure for triage: unfolded headers, the readable body text
//! (plain parts preferred over HTML), and the names and types of
//! attachments. Attachment content is never decoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;
use triage_domain::AttachmentInfo;

const MAX_DEPTH: usize = 8;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line pattern"));

/// Parsed message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMessage {
    /// Top-level headers in order, names as written
    pub headers: Vec<(String, String)>,
    /// Decoded readable text
    pub body: String,
    /// Enumerated attachments
    pub attachments: Vec<AttachmentInfo>,
}

impl ParsedMessage {
    /// First header with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Text and attachments gathered while walking the part tree
#[derive(Default)]
struct Collected {
    plain: Vec<String>,
    html: Vec<String>,
    attachments: Vec<AttachmentInfo>,
}

/// Parse a raw message
///
/// Input that does not open with a header block is treated as a bare
/// body with no headers.
pub fn parse_message(raw: &str) -> ParsedMessage {
    let normalized = raw.replace("\r\n", "\n");
    let trimmed = normalized.trim_start_matches('\n');

    if !looks_like_header(trimmed.lines().next().unwrap_or("")) {
        return ParsedMessage {
            headers: Vec::new(),
            body: trimmed.trim().to_string(),
            attachments: Vec::new(),
        };
    }

    let (head, body) = split_head_body(trimmed);
    let headers = parse_headers(head);

    let mut collected = Collected::default();
    walk(&headers, body, &mut collected, 0);

    let text = if collected.plain.is_empty() {
        collected.html.join("\n\n")
    } else {
        collected.plain.join("\n\n")
    };

    ParsedMessage {
        headers,
        body: text.trim().to_string(),
        attachments: collected.attachments,
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// `Name: value` with a token name and no leading whitespace
fn looks_like_header(line: &str) -> bool {
    match line.split_once(':') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    }
}

/// Split at the first blank line
fn split_head_body(text: &str) -> (&str, &str) {
    match text.find("\n\n") {
        Some(pos) => (&text[..pos], &text[pos + 2..]),
        None => (text, ""),
    }
}

/// Parse a header block, unfolding continuation lines
fn parse_headers(head: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}

/// Value of a `key=value` parameter in a structured header
fn header_param(value: &str, key: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|part| {
        let (k, v) = part.split_once('=')?;
        if k.trim().eq_ignore_ascii_case(key) {
            Some(v.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Media type without parameters, lowercased
fn media_type(headers: &[(String, String)]) -> String {
    find_header(headers, "Content-Type")
        .and_then(|v| v.split(';').next())
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text/plain".to_string())
}

fn attachment_name(headers: &[(String, String)]) -> Option<String> {
    let disposition = find_header(headers, "Content-Disposition");
    let from_disposition = disposition.and_then(|d| header_param(d, "filename"));
    let from_type = find_header(headers, "Content-Type").and_then(|t| header_param(t, "name"));
    let is_attachment = disposition
        .map(|d| d.trim_start().to_ascii_lowercase().starts_with("attachment"))
        .unwrap_or(false);

    match from_disposition.or(from_type) {
        Some(name) => Some(name),
        None if is_attachment => Some("unnamed".to_string()),
        None => None,
    }
}

fn walk(headers: &[(String, String)], body: &str, out: &mut Collected, depth: usize) {
    let media = media_type(headers);

    if media.starts_with("multipart/") && depth < MAX_DEPTH {
        let boundary = find_header(headers, "Content-Type").and_then(|v| header_param(v, "boundary"));
        if let Some(boundary) = boundary {
            for part in split_multipart(body, &boundary) {
                let (head, part_body) = split_head_body(part.trim_start_matches('\n'));
                // A part without headers starts straight with its blank line
                let (part_headers, part_body) = if looks_like_header(head.lines().next().unwrap_or("")) {
                    (parse_headers(head), part_body)
                } else {
                    (Vec::new(), part)
                };
                walk(&part_headers, part_body, out, depth + 1);
            }
            return;
        }
    }

    if let Some(filename) = attachment_name(headers) {
        out.attachments.push(AttachmentInfo {
            filename,
            content_type: media,
        });
        return;
    }

    let encoding = find_header(headers, "Content-Transfer-Encoding")
        .map(|e| e.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let charset = find_header(headers, "Content-Type").and_then(|v| header_param(v, "charset"));
    let text = decode_body(body, &encoding, charset.as_deref());

    if media == "text/html" {
        out.html.push(strip_html(&text));
    } else if media.starts_with("text/") {
        out.plain.push(text);
    }
}

/// Body sections between `--boundary` delimiter lines
fn split_multipart<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let delimiter = format!("--{}", boundary);
    let closing = format!("--{}--", boundary);

    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let bare = line.trim_end();
        if bare == delimiter || bare == closing {
            if let Some(s) = start {
                parts.push(body[s..offset].trim_end_matches('\n'));
            }
            if bare == closing {
                return parts;
            }
            start = Some(offset + line.len());
        }
        offset += line.len();
    }

    // Unterminated: keep what follows the last delimiter
    if let Some(s) = start {
        parts.push(body[s..].trim_end_matches('\n'));
    }
    parts
}

/// Undo the transfer encoding, then decode the bytes in the declared charset
///
/// Unknown or missing charsets are read as UTF-8. Unencoded bodies are
/// already text and pass through.
fn decode_body(body: &str, encoding: &str, charset: Option<&str>) -> String {
    let bytes = match encoding {
        "quoted-printable" => quoted_printable_bytes(body),
        "base64" => {
            let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            match STANDARD.decode(compact.as_bytes()) {
                Ok(bytes) => bytes,
                Err(_) => return body.to_string(),
            }
        }
        _ => return body.to_string(),
    };
    decode_charset(&bytes, charset)
}

fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Decode quoted-printable text (soft breaks and `=XX` escapes) as UTF-8
pub fn decode_quoted_printable(text: &str) -> String {
    String::from_utf8_lossy(&quoted_printable_bytes(text)).into_owned()
}

fn quoted_printable_bytes(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        // Soft line break
        if bytes.get(i + 1) == Some(&b'\n') {
            i += 2;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
            i += 3;
            continue;
        }
        let hex = bytes
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .and_then(|h| u8::from_str_radix(h, 16).ok());
        match hex {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(b'=');
                i += 1;
            }
        }
    }

    out
}

fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, "\n");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    BLANK_RUNS.replace_all(&lines.join("\n"), "\n\n").trim().to_string()
}
