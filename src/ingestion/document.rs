use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    PlainText,
    Markdown,
    Pdf,
    Docx,
}

impl DocumentType {
    /// Guesses the type from the file extension. Unknown extensions are treated as plain text.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "md" | "markdown" => Self::Markdown,
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Docx,
            _ => Self::PlainText,
        }
    }

    /// Whether the built-in extractor can read this type.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::PlainText | Self::Markdown)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText => write!(f, "plain text"),
            Self::Markdown => write!(f, "Markdown"),
            Self::Pdf => write!(f, "PDF"),
            Self::Docx => write!(f, "DOCX"),
        }
    }
}

/// One page of extracted text (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    pub number: u32,
    pub text: &'a str,
}

/// Splits text into pages on form feeds. Blank pages keep their number but are dropped.
pub fn split_pages(text: &str) -> Vec<Page<'_>> {
    text.split('\u{000C}')
        .enumerate()
        .filter(|(_, t)| !t.trim().is_empty())
        .map(|(i, t)| Page {
            number: i as u32 + 1,
            text: t,
        })
        .collect()
}

/// Decodes document bytes as UTF-8, dropping a leading BOM.
pub fn decode_text(bytes: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(bytes).ok()?;
    Some(text.strip_prefix('\u{FEFF}').unwrap_or(text))
}

/// File name used as the document identifier in records and reports.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
