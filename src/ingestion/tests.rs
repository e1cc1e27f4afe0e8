use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use super::*;
use crate::embedding::{HashEmbedder, MockEmbedder};
use crate::llm::ScriptedChat;

const REFERENCE: &str = "# Dispensing\n\
Operators must record the lot number before dispensing. The balance is located in room 4.\n\
\n\
- Labels shall be verified by a second person.\n\
- Spills should be reported within 24 hours.\n\
\u{000C}\
# Cleaning\n\
Equipment must be cleaned after each batch, e.g. with 70% ethanol.\n";

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(1), Duration::from_secs(5))
}

fn ingestor(embedder: Arc<dyn Embedder>) -> Ingestor {
    Ingestor::new(Arc::new(PlainTextNormalizer::new()), embedder, fast_retry())
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_document_type_from_extension() {
    assert_eq!(DocumentType::from_path(Path::new("a.md")), DocumentType::Markdown);
    assert_eq!(DocumentType::from_path(Path::new("a.TXT")), DocumentType::PlainText);
    assert_eq!(DocumentType::from_path(Path::new("a.pdf")), DocumentType::Pdf);
    assert_eq!(DocumentType::from_path(Path::new("a.docx")), DocumentType::Docx);
    assert_eq!(DocumentType::from_path(Path::new("README")), DocumentType::PlainText);
}

#[test]
fn test_split_pages_numbers_from_one() {
    let pages = split_pages("first\u{000C}\u{000C}third");
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert_eq!(pages[1].number, 3);
    assert_eq!(pages[1].text, "third");
}

#[test]
fn test_decode_text_strips_bom_and_rejects_binary() {
    assert_eq!(decode_text("\u{FEFF}hello".as_bytes()), Some("hello"));
    assert_eq!(decode_text(&[0xff, 0xfe, 0x00]), None);
}

#[test]
fn test_plain_normalizer_splits_sentences_and_bullets() {
    let statements = PlainTextNormalizer::new().normalize_text(REFERENCE);
    let texts: Vec<_> = statements.iter().map(|s| s.text.as_str()).collect();

    assert_eq!(
        texts,
        vec![
            "Operators must record the lot number before dispensing.",
            "The balance is located in room 4.",
            "Labels shall be verified by a second person.",
            "Spills should be reported within 24 hours.",
            "Equipment must be cleaned after each batch, e.g. with 70% ethanol.",
        ]
    );
}

#[test]
fn test_plain_normalizer_assigns_kind_severity_page_and_context() {
    let statements = PlainTextNormalizer::new().normalize_text(REFERENCE);

    assert_eq!(statements[0].kind, RecordKind::Requirement);
    assert_eq!(statements[0].severity, Severity::Must);
    assert_eq!(statements[0].page, 1);
    assert!(statements[0].context.starts_with("Dispensing: Operators must"));

    assert_eq!(statements[1].kind, RecordKind::Statement);
    assert_eq!(statements[1].severity, Severity::Unknown);

    assert_eq!(statements[3].severity, Severity::Should);
    assert_eq!(statements[3].context, "Dispensing");

    assert_eq!(statements[4].page, 2);
    assert_eq!(statements[4].context, "Cleaning");
}

#[test]
fn test_plain_normalizer_strips_markup_and_numbered_items() {
    let statements =
        PlainTextNormalizer::new().normalize_text("1. **Wear** gloves at `all` times.\n2) Wash hands.\n---\n");
    let texts: Vec<_> = statements.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Wear gloves at all times.", "Wash hands."]);
}

#[tokio::test]
async fn test_plain_normalizer_rejects_invalid_utf8() {
    let result = PlainTextNormalizer::new()
        .normalize(&[0xc3, 0x28], DocumentType::PlainText, "bad.txt")
        .await;
    assert!(matches!(result, Err(IngestionError::InvalidEncoding { .. })));
}

#[tokio::test]
async fn test_ingest_reference_builds_requirement_ids_per_page() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "gmp.md", REFERENCE);

    let records = ingestor(Arc::new(HashEmbedder::new(64).unwrap()))
        .ingest_reference(&path)
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["gmp.md-1-1", "gmp.md-1-2", "gmp.md-1-3", "gmp.md-2-1"]);
    assert!(records.iter().all(|r| r.kind() == RecordKind::Requirement));
    assert!(records.iter().all(|r| r.dimension() == 64));
    assert_eq!(records[0].source_document(), "gmp.md");
    assert_eq!(records[3].page(), 2);
    assert_eq!(records[1].severity(), Severity::Must);
}

#[tokio::test]
async fn test_ingest_target_keeps_every_statement() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "sop.txt", REFERENCE);

    let pool = ingestor(Arc::new(HashEmbedder::new(32).unwrap()))
        .ingest_target(&path)
        .await
        .unwrap();

    assert_eq!(pool.len(), 5);
    assert_eq!(pool.source_document(), "sop.txt");
    assert_eq!(pool.dimension(), Some(32));
    assert_eq!(pool.statements()[0].id(), "sop.txt#S1");
    assert!(pool.statements().iter().all(|s| s.kind() == RecordKind::Statement));
}

#[tokio::test]
async fn test_ingest_empty_target_yields_empty_pool() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "empty.md", "\n\n# Title only\n");

    let pool = ingestor(Arc::new(HashEmbedder::default()))
        .ingest_target(&path)
        .await
        .unwrap();
    assert!(pool.is_empty());
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    let dir = TempDir::new().unwrap();
    let pdf = write(&dir, "ref.pdf", "%PDF-1.7");
    let ingestor = ingestor(Arc::new(HashEmbedder::default()));

    assert!(matches!(
        ingestor.ingest_reference(&pdf).await,
        Err(IngestionError::UnsupportedDocumentType {
            kind: DocumentType::Pdf,
            ..
        })
    ));
    assert!(matches!(
        ingestor.ingest_target(&dir.path().join("nope.txt")).await,
        Err(IngestionError::Read { .. })
    ));
}

#[tokio::test]
async fn test_embedding_failure_is_fatal_for_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "sop.txt", "Wash hands. Wear gloves.");
    let embedder = MockEmbedder::new(8).fail_on("Wear gloves.");

    let result = ingestor(Arc::new(embedder.clone())).ingest_target(&path).await;

    assert!(matches!(result, Err(IngestionError::Embedding { .. })));
    // Transport errors are retried once before giving up.
    assert_eq!(embedder.call_count(), 3);
}

#[tokio::test]
async fn test_overlong_target_statement_is_dropped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let long = "Record the reading ".repeat(10);
    let path = write(&dir, "sop.txt", &format!("Wash hands.\n\n{long}\n\nWear gloves."));
    let embedder = HashEmbedder::new(16).unwrap().with_max_input_chars(40);

    let pool = ingestor(Arc::new(embedder))
        .ingest_target(&path)
        .await
        .unwrap();

    let texts: Vec<_> = pool.statements().iter().map(|s| s.text()).collect();
    assert_eq!(texts, vec!["Wash hands.", "Wear gloves."]);
    assert_eq!(pool.dropped(), 1);
    assert_eq!(pool.statements()[1].id(), "sop.txt#S3");
}

#[tokio::test]
async fn test_overlong_requirement_keeps_rest_of_reference() {
    let dir = TempDir::new().unwrap();
    let long = format!("Equipment must be cleaned {}", "and inspected ".repeat(10));
    let path = write(
        &dir,
        "gmp.txt",
        &format!("Operators must wear gloves.\n\n{long}\n\nLabels shall be verified."),
    );
    let embedder = HashEmbedder::new(16).unwrap().with_max_input_chars(40);

    let records = ingestor(Arc::new(embedder))
        .ingest_reference(&path)
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["gmp.txt-1-1", "gmp.txt-1-3"]);
}

#[tokio::test]
async fn test_embedder_dimension_drift_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "sop.txt", "Wash hands.");
    let embedder = MockEmbedder::new(8).with_vector("Wash hands.", vec![1.0, 0.0]);

    let result = ingestor(Arc::new(embedder)).ingest_target(&path).await;

    assert!(matches!(
        result,
        Err(IngestionError::Embedding {
            error: EmbeddingError::DimensionMismatch {
                expected: 8,
                actual: 2
            },
            ..
        })
    ));
}

#[tokio::test]
async fn test_ingest_references_skips_failing_files() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "a.txt", "Doors must be locked.");
    let bad = write(&dir, "b.docx", "binary");
    let other = write(&dir, "c.txt", "Keys shall be logged.");

    let batch = ingestor(Arc::new(HashEmbedder::default()))
        .ingest_references(&[good, bad.clone(), other])
        .await;

    assert_eq!(batch.files_ok, 2);
    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].path, bad);
}

#[tokio::test]
async fn test_llm_normalizer_parses_items_per_page() {
    let chat = ScriptedChat::new()
        .reply("```json\n[{\"requirement_text\": \"Record the lot number\", \"severity\": \"MUST\"}, {\"requirement_text\": \"  \"}]\n```")
        .reply("[\"Operators may use a scanner\", {\"text\": \"The room is blue\", \"severity\": \"UNKNOWN\"}]");
    let normalizer = LlmNormalizer::new(Arc::new(chat.clone()), fast_retry());

    let statements = normalizer
        .normalize(b"page one\x0cpage two", DocumentType::PlainText, "ref.txt")
        .await
        .unwrap();

    assert_eq!(chat.call_count(), 2);
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0].severity, Severity::Must);
    assert_eq!(statements[0].page, 1);
    assert_eq!(statements[0].context, "page one");
    assert_eq!(statements[1].severity, Severity::May);
    assert_eq!(statements[1].page, 2);
    assert_eq!(statements[2].kind, RecordKind::Statement);
}

#[tokio::test]
async fn test_llm_normalizer_retries_then_fails_on_garbage() {
    let chat = ScriptedChat::new().fail("throttled").reply("I cannot help with that.");
    let normalizer = LlmNormalizer::new(Arc::new(chat.clone()), fast_retry());

    let result = normalizer
        .normalize(b"text", DocumentType::Markdown, "ref.md")
        .await;

    assert!(matches!(
        result,
        Err(IngestionError::Normalization { ref source_document, .. }) if source_document == "ref.md"
    ));
    assert_eq!(chat.call_count(), 2);
}
