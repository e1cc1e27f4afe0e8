//! Embedding collaborators.
//!
//! - [`HashEmbedder`] is a deterministic, offline bag-of-words embedder.
//! - [`HttpEmbedder`] calls an OpenAI-compatible `/embeddings` endpoint.
//! - [`CachedEmbedder`] memoizes any embedder (embeddings are deterministic per text).

mod cached;
mod error;
mod hash;
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;


pub use cached::CachedEmbedder;
pub use error::EmbeddingError;
pub use hash::HashEmbedder;
pub use http::HttpEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;

use async_trait::async_trait;

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for identical input within one model version and
/// must always return [`dimension`](Embedder::dimension) values.
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Output dimensionality.
    fn dimension(&self) -> usize;

    /// Identifier of the model, used in logs.
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;
}

/// Rejects empty or over-length input before any work is done.
pub(crate) fn check_input(text: &str, max_chars: usize) -> EmbeddingResult<()> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(EmbeddingError::InputTooLong {
            chars,
            max: max_chars,
        });
    }
    Ok(())
}

/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
