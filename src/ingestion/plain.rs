use async_trait::async_trait;

use super::document::{DocumentType, decode_text, split_pages};
use super::error::{IngestionError, IngestionResult};
use super::{NormalizedStatement, Normalizer};
use crate::record::{RecordKind, Severity};

const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "no", "nos", "fig", "sec", "ref", "approx", "dr", "mr", "ms",
    "st", "min", "max", "incl", "cf",
];

/// Deterministic sentence/bullet splitter for plain text and Markdown.
///
/// Pages are separated by form feeds, passages by blank lines, and each list item is its own
/// passage. Headings are not emitted; they become the context of what follows. A sentence
/// with a modal verb (must, shall, should, may, ...) is a requirement, anything else a
/// statement.
#[derive(Debug, Clone, Default)]
pub struct PlainTextNormalizer;

impl PlainTextNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize_text(&self, text: &str) -> Vec<NormalizedStatement> {
        let mut out = Vec::new();
        let mut heading = String::new();
        for page in split_pages(text) {
            for passage in passages(page.text, &mut heading) {
                let sentences = split_sentences(&passage.text);
                let single = sentences.len() == 1;
                for sentence in sentences {
                    let severity = Severity::detect(&sentence);
                    let kind = if severity == Severity::Unknown {
                        RecordKind::Statement
                    } else {
                        RecordKind::Requirement
                    };
                    let context = match (single, passage.heading.is_empty()) {
                        (true, true) => String::new(),
                        (true, false) => passage.heading.clone(),
                        (false, true) => passage.text.clone(),
                        (false, false) => format!("{}: {}", passage.heading, passage.text),
                    };
                    out.push(NormalizedStatement {
                        text: sentence,
                        kind,
                        page: page.number,
                        severity,
                        context,
                    });
                }
            }
        }
        out
    }
}

#[async_trait]
impl Normalizer for PlainTextNormalizer {
    fn name(&self) -> &str {
        "plain-text"
    }

    async fn normalize(
        &self,
        bytes: &[u8],
        doc_type: DocumentType,
        source: &str,
    ) -> IngestionResult<Vec<NormalizedStatement>> {
        if !doc_type.is_text() {
            return Err(IngestionError::UnsupportedDocumentType {
                path: source.into(),
                kind: doc_type,
            });
        }
        let text = decode_text(bytes).ok_or_else(|| IngestionError::InvalidEncoding {
            source_document: source.to_string(),
        })?;
        Ok(self.normalize_text(text))
    }
}

struct Passage {
    heading: String,
    text: String,
}

fn passages(page: &str, heading: &mut String) -> Vec<Passage> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for raw in page.lines() {
        let line = raw.trim();
        if line.is_empty() || is_rule(line) {
            flush(&mut current, &mut out, heading);
            continue;
        }
        if let Some(title) = heading_text(line) {
            flush(&mut current, &mut out, heading);
            *heading = strip_inline_markup(title);
            continue;
        }
        if let Some(item) = list_item(line) {
            flush(&mut current, &mut out, heading);
            current.push(item);
            continue;
        }
        current.push(line);
    }
    flush(&mut current, &mut out, heading);
    out
}

fn flush(current: &mut Vec<&str>, out: &mut Vec<Passage>, heading: &str) {
    if current.is_empty() {
        return;
    }
    let text = strip_inline_markup(&current.join(" "));
    if !text.is_empty() {
        out.push(Passage {
            heading: heading.to_string(),
            text,
        });
    }
    current.clear();
}

fn heading_text(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &line[hashes..];
        if rest.is_empty() || rest.starts_with(' ') {
            return Some(rest.trim());
        }
    }
    None
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| matches!(c, '-' | '*' | '_' | '='))
}

fn list_item(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "+ ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim_start_matches("[ ] ").trim_start_matches("[x] ").trim());
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && digits <= 3 {
        let rest = &line[digits..];
        if let Some(item) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(item.trim());
        }
    }
    None
}

fn strip_inline_markup(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .replace('`', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits on `.`, `!`, `?` followed by whitespace, skipping known abbreviations and
/// decimal numbers.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(offset, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let next = chars.get(i + 1).map(|&(_, n)| n);
        if !matches!(next, Some(n) if n.is_whitespace()) {
            continue;
        }
        let candidate = &text[start..offset];
        if c == '.' && ends_with_abbreviation(candidate) {
            continue;
        }
        push_sentence(&mut sentences, &text[start..offset + c.len_utf8()]);
        start = offset + c.len_utf8();
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn ends_with_abbreviation(text: &str) -> bool {
    let last = text
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    ABBREVIATIONS.contains(&last.as_str()) || (last.len() == 1 && last.chars().all(char::is_alphabetic))
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let sentence = raw.trim();
    if sentence.chars().filter(|c| c.is_alphabetic()).count() >= 3 {
        out.push(sentence.to_string());
    }
}
