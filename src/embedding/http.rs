use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Embedder, EmbeddingError, EmbeddingResult, check_input};
use crate::constants::{DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_MAX_INPUT_CHARS};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings endpoint (`POST {url}` with `{model, input}`).
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    http: HttpClient,
    url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    max_input_chars: usize,
}

impl HttpEmbedder {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> EmbeddingResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding endpoint URL is empty".to_string(),
            });
        }
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "dimension must be greater than zero".to_string(),
            });
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS))
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            url,
            model: model.into(),
            api_key: None,
            dimension,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        check_input(text, self.max_input_chars)?;

        let mut request = self.http.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Request {
                reason: format!("HTTP {status}: {}", body.chars().take(200).collect::<String>()),
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "response contained no embeddings".to_string(),
            })?;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(EmbeddingError::InvalidResponse {
                reason: "embedding contains non-finite values".to_string(),
            });
        }

        debug!(model = %self.model, chars = text.len(), "Embedded text via HTTP");
        Ok(embedding)
    }
}
