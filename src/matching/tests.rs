use super::*;

fn unit_at(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt()]
}

fn requirement() -> AtomicRecord {
    AtomicRecord::requirement(
        "R1",
        "ref.txt",
        "Operator must record lot number before dispensing",
        vec![1.0, 0.0],
    )
}

fn pool(statements: Vec<(&str, Vec<f32>)>) -> CandidatePool {
    let records = statements
        .into_iter()
        .map(|(id, embedding)| AtomicRecord::statement(id, "sop.md", format!("text {id}"), embedding))
        .collect();
    CandidatePool::from_statements("sop.md", records).unwrap()
}

fn matcher(top_k: usize, threshold: f32) -> SemanticMatcher {
    SemanticMatcher::new(MatcherConfig { top_k, threshold }).unwrap()
}

#[test]
fn test_cosine_similarity_basics() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    // Magnitude does not matter.
    assert!((cosine_similarity(&[2.0, 2.0], &[0.5, 0.5]) - 1.0).abs() < 1e-6);
}

#[test]
fn test_cosine_similarity_degenerate_inputs_score_zero() {
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
}

#[test]
fn test_config_validation() {
    assert_eq!(
        SemanticMatcher::new(MatcherConfig {
            top_k: 0,
            threshold: 0.5
        })
        .unwrap_err(),
        MatchingError::ZeroTopK
    );
    assert!(matches!(
        SemanticMatcher::new(MatcherConfig {
            top_k: 3,
            threshold: 1.5
        }),
        Err(MatchingError::ThresholdOutOfRange(_))
    ));
    assert!(MatcherConfig::default().validate().is_ok());
}

#[test]
fn test_close_statement_matches_above_threshold() {
    let result = matcher(3, 0.5).match_requirement(&requirement(), &pool(vec![("S1", unit_at(0.92))]));

    assert_eq!(result.len(), 1);
    let top = result.iter().next().unwrap();
    assert_eq!(top.statement_id, "S1");
    assert!((top.score - 0.92).abs() < 1e-4);
}

#[test]
fn test_empty_pool_yields_empty_result() {
    let result = matcher(3, 0.5).match_requirement(&requirement(), &CandidatePool::new("sop.md"));
    assert!(result.is_empty());
    assert_eq!(result.top_score(), None);
}

#[test]
fn test_below_threshold_is_discarded() {
    let result = matcher(3, 0.5).match_requirement(&requirement(), &pool(vec![("S1", unit_at(0.1))]));
    assert!(result.is_empty());
}

#[test]
fn test_threshold_is_inclusive() {
    let result = matcher(3, 0.0).match_requirement(&requirement(), &pool(vec![("S1", vec![0.0, 1.0])]));
    assert_eq!(result.len(), 1);
}

#[test]
fn test_ranking_is_descending_and_truncated() {
    let candidates = pool(vec![
        ("S1", unit_at(0.4)),
        ("S2", unit_at(0.9)),
        ("S3", unit_at(0.6)),
        ("S4", unit_at(0.8)),
        ("S5", unit_at(0.2)),
    ]);

    let result = matcher(3, 0.3).match_requirement(&requirement(), &candidates);

    let ids: Vec<_> = result.iter().map(|m| m.statement_id.as_str()).collect();
    assert_eq!(ids, vec!["S2", "S4", "S3"]);
    let scores: Vec<f32> = result.iter().map(|m| m.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_ties_keep_pool_order() {
    let candidates = pool(vec![
        ("S1", vec![0.0, 1.0]),
        ("S2", vec![1.0, 0.0]),
        ("S3", vec![2.0, 0.0]),
        ("S4", vec![3.0, 0.0]),
    ]);

    let result = matcher(2, 0.5).match_requirement(&requirement(), &candidates);

    let ids: Vec<_> = result.iter().map(|m| m.statement_id.as_str()).collect();
    assert_eq!(ids, vec!["S2", "S3"]);
}

#[test]
fn test_matching_is_deterministic() {
    let candidates = pool(vec![
        ("S1", unit_at(0.7)),
        ("S2", unit_at(0.7)),
        ("S3", unit_at(0.95)),
    ]);
    let m = matcher(3, 0.3);

    let first = m.match_requirement(&requirement(), &candidates);
    let second = m.match_requirement(&requirement(), &candidates);

    assert_eq!(first, second);
}

#[test]
fn test_mismatched_dimension_is_skipped() {
    let mut candidates = CandidatePool::new("sop.md");
    candidates
        .push(AtomicRecord::statement("S1", "sop.md", "three dims", vec![1.0, 0.0, 0.0]))
        .unwrap();

    let result = matcher(3, -1.0).match_requirement(&requirement(), &candidates);
    assert!(result.is_empty());
}

#[test]
fn test_zero_norm_statement_is_skipped_at_any_threshold() {
    let candidates = pool(vec![("S1", vec![0.0, 0.0]), ("S2", unit_at(0.4))]);

    let result = matcher(3, -0.5).match_requirement(&requirement(), &candidates);

    let ids: Vec<_> = result.iter().map(|m| m.statement_id.as_str()).collect();
    assert_eq!(ids, vec!["S2"]);
}

#[test]
fn test_zero_norm_requirement_matches_nothing() {
    let blank = AtomicRecord::requirement("R0", "ref.txt", "...", vec![0.0, 0.0]);
    let candidates = pool(vec![("S1", unit_at(0.9))]);

    assert!(matcher(3, -1.0).match_requirement(&blank, &candidates).is_empty());
    assert!(is_zero_norm(&[0.0, 0.0]));
    assert!(!is_zero_norm(&[0.0, 1e-6]));
}

#[test]
fn test_texts_follow_rank_order() {
    let candidates = pool(vec![("S1", unit_at(0.5)), ("S2", unit_at(0.9))]);
    let result = matcher(3, 0.3).match_requirement(&requirement(), &candidates);

    assert_eq!(result.texts(), vec!["text S2".to_string(), "text S1".to_string()]);
    assert!((result.top_score().unwrap() - 0.9).abs() < 1e-4);
}
