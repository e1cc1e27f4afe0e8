use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Embedder, EmbeddingError, EmbeddingResult, HashEmbedder};

/// Test embedder: fixed vectors for known texts, hash embedding otherwise.
///
/// Texts registered with [`fail_on`](MockEmbedder::fail_on) return a transport error.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    fallback: HashEmbedder,
    fixed: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    failing: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            fallback: HashEmbedder::new(dimension.max(1)).unwrap_or_default(),
            fixed: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.lock().insert(text.into(), vector);
        self
    }

    pub fn fail_on(self, text: impl Into<String>) -> Self {
        self.failing.lock().push(text.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn dimension(&self) -> usize {
        self.fallback.dimension()
    }

    fn model_id(&self) -> &str {
        "mock"
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().iter().any(|t| t == text) {
            return Err(EmbeddingError::Request {
                reason: format!("simulated failure for {text:?}"),
            });
        }
        if let Some(vector) = self.fixed.lock().get(text) {
            return Ok(vector.clone());
        }
        self.fallback.embed_sync(text)
    }
}
