use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::document::{DocumentType, decode_text, split_pages};
use super::error::{IngestionError, IngestionResult};
use super::{NormalizedStatement, Normalizer};
use crate::llm::{ChatModel, extract_json};
use crate::record::{RecordKind, Severity};
use crate::retry::RetryPolicy;

const ANALYST_PROMPT: &str = r#"You are a regulatory compliance analyst.
Decompose the text into atomic, auditable statements.

- One item = one independently checkable obligation or procedural claim.
- Do not merge obligations. Do not split a single obligation unnecessarily.
- Split enumerations ("education, training, and experience") into separate items.
- Keep the original wording; do not paraphrase.
- Set severity from the modal verb: MUST (must/shall/required), SHOULD, MAY, or UNKNOWN for descriptive text.

Return a JSON array only:
[{"requirement_text": "verbatim text", "severity": "MUST | SHOULD | MAY | UNKNOWN"}]"#;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Structured {
        #[serde(alias = "text")]
        requirement_text: String,
        #[serde(default)]
        severity: Option<String>,
    },
    Bare(String),
}

/// Normalizer that asks a chat model to decompose each page into atomic items.
#[derive(Debug, Clone)]
pub struct LlmNormalizer {
    chat: Arc<dyn ChatModel>,
    retry: RetryPolicy,
}

impl LlmNormalizer {
    pub fn new(chat: Arc<dyn ChatModel>, retry: RetryPolicy) -> Self {
        Self { chat, retry }
    }

    async fn normalize_page(
        &self,
        source: &str,
        page: u32,
        text: &str,
    ) -> IngestionResult<Vec<NormalizedStatement>> {
        let prompt = format!("Text:\n\"\"\"\n{}\n\"\"\"", text.trim());
        let label = format!("{source} page {page}");
        let reply = self
            .retry
            .run(&label, || async {
                self.chat
                    .complete(ANALYST_PROMPT, &prompt)
                    .await
                    .map_err(IngestionError::from)
            })
            .await
            .map_err(|e| match e {
                IngestionError::Normalization { reason, .. } => IngestionError::Normalization {
                    source_document: source.to_string(),
                    reason,
                },
                other => other,
            })?;

        let items = parse_items(&reply).map_err(|reason| IngestionError::Normalization {
            source_document: source.to_string(),
            reason: format!("page {page}: {reason}"),
        })?;

        let context = text.trim().to_string();
        Ok(items
            .into_iter()
            .map(|(text, severity)| {
                let kind = if severity == Severity::Unknown {
                    RecordKind::Statement
                } else {
                    RecordKind::Requirement
                };
                NormalizedStatement {
                    text,
                    kind,
                    page,
                    severity,
                    context: context.clone(),
                }
            })
            .collect())
    }
}

fn parse_items(reply: &str) -> Result<Vec<(String, Severity)>, String> {
    let json = extract_json(reply).ok_or("reply contains no JSON array")?;
    let raw: Vec<RawItem> = serde_json::from_str(json).map_err(|e| e.to_string())?;

    Ok(raw
        .into_iter()
        .filter_map(|item| {
            let (text, severity) = match item {
                RawItem::Structured {
                    requirement_text,
                    severity,
                } => {
                    let severity = severity
                        .and_then(|s| s.parse().ok())
                        .unwrap_or_else(|| Severity::detect(&requirement_text));
                    (requirement_text, severity)
                }
                RawItem::Bare(text) => {
                    let severity = Severity::detect(&text);
                    (text, severity)
                }
            };
            let text = text.trim().to_string();
            (!text.is_empty()).then_some((text, severity))
        })
        .collect())
}

#[async_trait]
impl Normalizer for LlmNormalizer {
    fn name(&self) -> &str {
        self.chat.model()
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

        let mut out = Vec::new();
        for page in split_pages(text) {
            let items = self.normalize_page(source, page.number, page.text).await?;
            if items.is_empty() {
                warn!(source, page = page.number, "Model returned no items for page");
            }
            debug!(source, page = page.number, items = items.len(), "Normalized page");
            out.extend(items);
        }
        Ok(out)
    }
}
