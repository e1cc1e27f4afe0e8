use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;

use super::{Embedder, EmbeddingResult};

/// Memoizes an inner [`Embedder`] by exact text.
///
/// Ingesting a reference corpus often repeats boilerplate sentences; each is embedded once.
#[derive(Debug)]
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    entries: Cache<String, Arc<Vec<f32>>>,
}

impl CachedEmbedder {
    const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn Embedder>, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if let Some(hit) = self.entries.get(text) {
            return Ok(hit.as_ref().clone());
        }
        let embedding = self.inner.embed(text).await?;
        self.entries
            .insert(text.to_string(), Arc::new(embedding.clone()));
        Ok(embedding)
    }
}
