use async_trait::async_trait;

use super::{Embedder, EmbeddingError, EmbeddingResult, check_input, l2_normalize};
use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_INPUT_CHARS};
use crate::hashing::hash_token;

const BIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedder over lowercase unigrams and bigrams.
///
/// Needs no model files or network, so it backs offline runs and tests. Texts sharing
/// vocabulary get high cosine similarity; it has no notion of synonyms.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    max_input_chars: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_EMBEDDING_DIM,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> EmbeddingResult<Self> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "dimension must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            dimension,
            ..Self::default()
        })
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Synchronous embedding, shared by the async trait method and benchmarks.
    pub fn embed_sync(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        check_input(text, self.max_input_chars)?;

        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let h = hash_token(feature);
        let slot = (h % self.dimension as u64) as usize;
        // Top bit picks the sign so collisions tend to cancel instead of pile up.
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        vector[slot] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "blake3-hash"
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_sync(text)
    }
}
