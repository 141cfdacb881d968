//! Text embedding backends.
//!
//! The [`Embedder`] trait is the seam between the index and whatever model
//! turns text into vectors. The same embedder (same [`Embedder::model_id`])
//! must be used at seed time and at query time; vectors from different models
//! are not comparable and retrieval quality degrades silently if they mix.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{AssistantError, Result};

/// A provider that turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts in one call, returning one vector per input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::Embedding {
                provider: self.model_id().to_string(),
                message: "backend returned no embedding".to_string(),
            })
    }

    /// Identifier of the underlying model, recorded alongside stored vectors.
    fn model_id(&self) -> &str;
}

// ── Ollama ──────────────────────────────────────────────────────────

/// Embeddings from an Ollama server (`POST {base_url}/api/embed`).
///
/// The default model, `all-minilm`, is the 384-dimension all-MiniLM-L6-v2
/// sentence encoder.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(AssistantError::Config(
                "embedding model must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistantError::Embedding {
                provider: "ollama".to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model,
        })
    }

    fn failure(&self, message: String) -> AssistantError {
        AssistantError::Embedding {
            provider: format!("ollama/{}", self.model),
            message,
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, batch_size = texts.len(), "embedding batch");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "embedding request failed");
                self.failure(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, %status, "embedding API error");
            return Err(self.failure(format!("API returned {status}: {body}")));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| self.failure(format!("failed to parse response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(self.failure(format!(
                "returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }
        if parsed.embeddings.iter().any(Vec::is_empty) {
            return Err(self.failure("returned an empty embedding".to_string()));
        }

        Ok(parsed.embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ── Feature hashing ─────────────────────────────────────────────────

/// Deterministic offline embedder based on token feature hashing.
///
/// Each lower-cased alphanumeric token is hashed with CRC32 into one of
/// `dimensions` buckets and the counts are L2-normalised. It captures lexical
/// overlap only, which is enough for air-gapped seeding and for exercising
/// the pipeline without a model server.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_id: format!("hashing-crc32-{dimensions}"),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut buckets = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let bucket = crc32fast::hash(token.as_bytes()) as usize % self.dimensions;
            buckets[bucket] += 1.0;
        }

        let norm = buckets.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut buckets {
                *x /= norm;
            }
        }
        buckets
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
