use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::constants::DEGRADED_JUSTIFICATION;
use crate::llm::ScriptedChat;
use crate::matching::MatchedStatement;
use crate::retry::RetryPolicy;

const R1: &str = "Operator must record lot number before dispensing";

fn requirement() -> AtomicRecord {
    AtomicRecord::requirement("R1", "ref.txt", R1, vec![1.0, 0.0])
}

fn one_match(score: f32) -> MatchResult {
    MatchResult::from_matches(vec![MatchedStatement {
        statement_id: "S1".to_string(),
        text: "Record lot number prior to dispensing material".to_string(),
        page: 1,
        score,
    }])
}

fn fast_policy(max_attempts: u32) -> AdjudicationPolicy {
    AdjudicationPolicy::with_retry(RetryPolicy::new(
        max_attempts,
        Duration::from_millis(1),
        Duration::from_secs(5),
    ))
}

#[test]
fn test_classification_parsing() {
    assert_eq!("SATISFIED".parse::<Classification>().unwrap(), Classification::Satisfied);
    assert_eq!(" present ".parse::<Classification>().unwrap(), Classification::Satisfied);
    assert_eq!("Partially Satisfied".parse::<Classification>().unwrap(), Classification::Partial);
    assert_eq!("weak".parse::<Classification>().unwrap(), Classification::Weak);
    assert!(matches!(
        "MISSING".parse::<Classification>(),
        Err(AdjudicationError::UnknownClassification { label }) if label == "MISSING"
    ));
    assert!("maybe".parse::<Classification>().is_err());
}

#[test]
fn test_parse_verdict_fenced_json() {
    let verdict = parse_verdict(
        "```json\n{\"status\": \"PARTIAL\", \"justification\": \"No timeframe given.\"}\n```",
    )
    .unwrap();
    assert_eq!(verdict, Verdict::new(Classification::Partial, "No timeframe given."));
}

#[test]
fn test_parse_verdict_alternate_keys_and_missing_justification() {
    let verdict = parse_verdict(r#"{"classification": "WEAK", "reason": "  vague  "}"#).unwrap();
    assert_eq!(verdict.justification, "vague");

    let bare = parse_verdict(r#"{"status": "SATISFIED"}"#).unwrap();
    assert_eq!(bare.classification, Classification::Satisfied);
    assert!(!bare.justification.is_empty());
}

#[test]
fn test_parse_verdict_rejects_free_text_and_missing_status() {
    assert!(matches!(
        parse_verdict("SATISFIED - the SOP covers it"),
        Err(AdjudicationError::UnparseableResponse { .. })
    ));
    assert!(matches!(
        parse_verdict(r#"{"justification": "fine"}"#),
        Err(AdjudicationError::UnparseableResponse { .. })
    ));
    assert!(matches!(
        parse_verdict(r#"{"status": "MISSING", "justification": "irrelevant"}"#),
        Err(AdjudicationError::UnknownClassification { .. })
    ));
}

#[tokio::test]
async fn test_empty_match_is_missing_without_judge_call() {
    let judge = MockJudge::default();
    let adjudicator = Adjudicator::new(Arc::new(judge.clone()), fast_policy(2));

    let outcome = adjudicator.adjudicate(&requirement(), &MatchResult::empty()).await;

    assert_eq!(outcome.status, FindingStatus::Missing);
    assert_eq!(outcome.justification, MISSING_JUSTIFICATION);
    assert!(!outcome.degraded);
    assert_eq!(judge.call_count(), 0);
}

#[tokio::test]
async fn test_judge_verdict_is_recorded() {
    let judge = MockJudge::default().with_verdict(
        R1,
        Verdict::new(Classification::Satisfied, "statement covers lot recording before dispensing"),
    );
    let adjudicator = Adjudicator::new(Arc::new(judge.clone()), fast_policy(2));

    let outcome = adjudicator.adjudicate(&requirement(), &one_match(0.92)).await;

    assert_eq!(outcome.status, FindingStatus::Satisfied);
    assert_eq!(outcome.justification, "statement covers lot recording before dispensing");
    assert_eq!(outcome.attempts, 1);
    assert_eq!(judge.call_count(), 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let judge = MockJudge::new(Verdict::new(Classification::Partial, "no role named")).fail_times(R1, 1);
    let adjudicator = Adjudicator::new(Arc::new(judge.clone()), fast_policy(2));

    let outcome = adjudicator.adjudicate(&requirement(), &one_match(0.8)).await;

    assert_eq!(outcome.status, FindingStatus::Partial);
    assert!(!outcome.degraded);
    assert_eq!(outcome.attempts, 2);
}

#[tokio::test]
async fn test_persistent_failure_degrades_to_weak() {
    let judge = MockJudge::default().fail_on(R1);
    let adjudicator = Adjudicator::new(Arc::new(judge.clone()), fast_policy(2));

    let outcome = adjudicator.adjudicate(&requirement(), &one_match(0.8)).await;

    assert_eq!(outcome.status, FindingStatus::Weak);
    assert_eq!(outcome.justification, DEGRADED_JUSTIFICATION);
    assert!(outcome.degraded);
    assert_eq!(judge.call_count(), 2);
}

#[tokio::test]
async fn test_out_of_taxonomy_label_degrades() {
    let judge = MockJudge::default().fail_with(
        R1,
        AdjudicationError::UnknownClassification {
            label: "COMPLIANT".to_string(),
        },
    );
    let adjudicator = Adjudicator::new(Arc::new(judge), fast_policy(2));

    let outcome = adjudicator.adjudicate(&requirement(), &one_match(0.8)).await;
    assert!(outcome.degraded);
    assert_eq!(outcome.status, FindingStatus::Weak);
}

#[tokio::test]
async fn test_judge_timeout_degrades() {
    let judge = MockJudge::default().delay_for(R1, Duration::from_secs(5));
    let policy = AdjudicationPolicy::with_retry(RetryPolicy::new(
        2,
        Duration::from_millis(1),
        Duration::from_millis(20),
    ));
    let adjudicator = Adjudicator::new(Arc::new(judge.clone()), policy);

    let outcome = adjudicator.adjudicate(&requirement(), &one_match(0.8)).await;

    assert!(outcome.degraded);
    assert_eq!(outcome.attempts, 2);
}

#[tokio::test]
async fn test_auto_satisfy_skips_judge() {
    let judge = MockJudge::new(Verdict::new(Classification::Weak, "vague"));
    let adjudicator =
        Adjudicator::new(Arc::new(judge.clone()), fast_policy(2)).with_auto_satisfy(Some(0.9));

    let strong = adjudicator.adjudicate(&requirement(), &one_match(0.95)).await;
    assert_eq!(strong.status, FindingStatus::Satisfied);
    assert_eq!(judge.call_count(), 0);

    let weaker = adjudicator.adjudicate(&requirement(), &one_match(0.85)).await;
    assert_eq!(weaker.status, FindingStatus::Weak);
    assert_eq!(judge.call_count(), 1);
}

#[tokio::test]
async fn test_llm_judge_parses_chat_reply() {
    let chat = ScriptedChat::new()
        .reply("Sure!\n```json\n{\"status\": \"PRESENT\", \"justification\": \"Explicit.\"}\n```");
    let judge = LlmJudge::new(Arc::new(chat.clone()));

    let verdict = judge
        .judge(R1, &["Record lot number prior to dispensing material".to_string()])
        .await
        .unwrap();

    assert_eq!(verdict, Verdict::new(Classification::Satisfied, "Explicit."));
    let prompt = &chat.prompts()[0];
    assert!(prompt.contains(R1));
    assert!(prompt.contains("[1] Record lot number prior to dispensing material"));
}

#[tokio::test]
async fn test_llm_judge_surfaces_chat_failure() {
    let chat = ScriptedChat::new().fail("provider down");
    let judge = LlmJudge::new(Arc::new(chat));

    assert!(matches!(
        judge.judge(R1, &["x".to_string()]).await,
        Err(AdjudicationError::Request { .. })
    ));
}
