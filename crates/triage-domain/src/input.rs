//! Raw submitted input

/// Leading bytes of every PDF file
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// How far into the input the PDF signature may start
///
/// Readers tolerate junk (CR/LF, BOM, mail transport padding) before the
/// header, so the signature is searched for in this leading window.
pub const PDF_WINDOW: usize = 1024;

/// Bytes submitted for triage, with an optional filename hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    /// Document bytes as received
    pub bytes: Vec<u8>,
    /// Original filename, used only as a detection hint
    pub filename: Option<String>,
}

impl RawInput {
    /// Wrap raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: None,
        }
    }

    /// Attach a filename hint
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// View the input as UTF-8 text, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Lossy text view (invalid sequences replaced)
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Offset of the PDF signature within the leading window
    pub fn pdf_offset(&self) -> Option<usize> {
        let window = &self.bytes[..self.bytes.len().min(PDF_WINDOW)];
        window
            .windows(PDF_SIGNATURE.len())
            .position(|w| w == PDF_SIGNATURE)
    }

    /// The PDF document starting at its signature, if there is one
    pub fn pdf_slice(&self) -> Option<&[u8]> {
        self.pdf_offset().map(|offset| &self.bytes[offset..])
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for empty or whitespace-only input
    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(|b| b.is_ascii_whitespace())
    }

    /// True for zero-length input
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl From<String> for RawInput {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}
