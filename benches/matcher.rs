//! Benchmarks for the semantic matcher.
//!
//! Run with: cargo bench --bench matcher

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sopcheck::embedding::HashEmbedder;
use sopcheck::matching::{MatcherConfig, SemanticMatcher, cosine_similarity};
use sopcheck::record::{AtomicRecord, CandidatePool};
use std::hint::black_box;

const DIMENSION: usize = 384;

fn statement_text(i: usize) -> String {
    format!(
        "Step {i}: the operator verifies line clearance and records the batch number in log {}",
        i % 17
    )
}

fn pool_of(embedder: &HashEmbedder, size: usize) -> CandidatePool {
    let statements = (0..size)
        .map(|i| {
            let text = statement_text(i);
            let embedding = embedder.embed_sync(&text).expect("embeddable text");
            AtomicRecord::statement(format!("sop#S{i}"), "sop.md", text, embedding)
        })
        .collect();
    CandidatePool::from_statements("sop.md", statements).expect("uniform dimension")
}

fn bench_cosine(c: &mut Criterion) {
    let embedder = HashEmbedder::new(DIMENSION).expect("nonzero dimension");
    let a = embedder.embed_sync(&statement_text(1)).expect("embeddable text");
    let b = embedder.embed_sync(&statement_text(2)).expect("embeddable text");

    c.bench_function("cosine_similarity_384", |bench| {
        bench.iter(|| cosine_similarity(black_box(&a), black_box(&b)))
    });
}

fn bench_match_requirement(c: &mut Criterion) {
    let embedder = HashEmbedder::new(DIMENSION).expect("nonzero dimension");
    let requirement = AtomicRecord::requirement(
        "gmp-1-1",
        "gmp.md",
        "Line clearance must be verified and recorded before each batch.",
        embedder
            .embed_sync("Line clearance must be verified and recorded before each batch.")
            .expect("embeddable text"),
    );
    let matcher = SemanticMatcher::new(MatcherConfig::default()).expect("default config");

    let mut group = c.benchmark_group("match_requirement");
    for size in [10usize, 100, 1_000] {
        let pool = pool_of(&embedder, size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &pool, |bench, pool| {
            bench.iter(|| matcher.match_requirement(black_box(&requirement), black_box(pool)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cosine, bench_match_requirement);
criterion_main!(benches);
