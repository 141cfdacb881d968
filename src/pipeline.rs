//! The question-answering pipeline:
//! redact → topic filter → retrieve → gate → compose.
//!
//! [`Assistant`] is built once at startup and shared by every request. Each
//! stage can end the request early with a fixed reply; only an empty query
//! is reported as an error.

use std::sync::Arc;

use tracing::{debug, info};

use crate::compose::{compose, AnswerComposer, GenerativeComposer, TemplateComposer};
use crate::config::{AnswerStrategy, EmbeddingBackend, Settings};
use crate::embedding::{Embedder, HashingEmbedder, OllamaEmbedder};
use crate::error::{AssistantError, Result};
use crate::gate::{gate, Decision, DEFAULT_THRESHOLD};
use crate::llm::ChatClient;
use crate::redact::redact;
use crate::retriever::{EmbeddingIndex, DEFAULT_COLLECTION};
use crate::topic::{TopicFilter, OUT_OF_SCOPE_REPLY};

/// Which stage produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    OutOfScope,
    NoMatch,
    BelowThreshold,
    Answered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub reply: String,
    pub outcome: Outcome,
}

/// Shared, read-only context for answering questions.
pub struct Assistant {
    index: Arc<EmbeddingIndex>,
    topic_filter: TopicFilter,
    composer: Arc<dyn AnswerComposer>,
    threshold: f32,
    top_k: usize,
}

impl Assistant {
    /// An assistant with the default topic list, threshold and `top_k` of 3.
    pub fn new(index: Arc<EmbeddingIndex>, composer: Arc<dyn AnswerComposer>) -> Self {
        Self {
            index,
            topic_filter: TopicFilter::default(),
            composer,
            threshold: DEFAULT_THRESHOLD,
            top_k: crate::config::DEFAULT_TOP_K,
        }
    }

    pub fn with_topic_filter(mut self, topic_filter: TopicFilter) -> Self {
        self.topic_filter = topic_filter;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Build the index, embedder and composer described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let index = Arc::new(EmbeddingIndex::open(
            &settings.index_path,
            DEFAULT_COLLECTION,
            build_embedder(settings)?,
        )?);

        let composer: Arc<dyn AnswerComposer> = match settings.answer_strategy {
            AnswerStrategy::Template => Arc::new(TemplateComposer),
            AnswerStrategy::Generative => {
                let client = ChatClient::new(
                    &settings.ollama_url,
                    settings.ollama_model.clone(),
                    settings.generation_timeout(),
                )
                .map_err(|e| AssistantError::Config(e.to_string()))?;
                Arc::new(GenerativeComposer::new(client))
            }
        };

        info!(
            collection = DEFAULT_COLLECTION,
            documents = index.len(),
            strategy = composer.name(),
            threshold = settings.relevance_threshold,
            top_k = settings.top_k,
            "assistant ready"
        );

        Ok(Self::new(index, composer)
            .with_topic_filter(TopicFilter::new(&settings.topic_keywords))
            .with_threshold(settings.relevance_threshold)
            .with_top_k(settings.top_k))
    }

    /// Answer one question.
    ///
    /// The query is redacted here even if the HTTP layer already did so;
    /// this is the only scrub guaranteed to run on every path.
    ///
    /// # Errors
    ///
    /// [`AssistantError::EmptyQuery`] if nothing but whitespace is left
    /// after redaction. Every other failure becomes a reply.
    pub async fn answer(&self, raw_query: &str) -> Result<Answer> {
        let query = redact(raw_query);
        if query.trim().is_empty() {
            return Err(AssistantError::EmptyQuery);
        }

        if !self.topic_filter.in_scope(&query) {
            debug!(query = %query, "out of scope");
            return Ok(Answer {
                reply: OUT_OF_SCOPE_REPLY.to_string(),
                outcome: Outcome::OutOfScope,
            });
        }

        let results = self.index.query(&query, self.top_k).await;
        let decision = gate(results, self.threshold);
        let outcome = match &decision {
            Decision::NoMatch => Outcome::NoMatch,
            Decision::BelowThreshold { top_similarity } => {
                debug!(top_similarity, threshold = self.threshold, "below threshold");
                Outcome::BelowThreshold
            }
            Decision::Usable(results) => {
                debug!(hits = results.len(), top = %results[0].id, "usable match");
                Outcome::Answered
            }
        };

        let reply = compose(self.composer.as_ref(), &query, decision).await;
        Ok(Answer { reply, outcome })
    }

    /// Check the composer's upstream service, if it has one. Never fails.
    pub async fn check_upstream(&self) {
        self.composer.check_availability().await;
    }

    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Construct the embedder selected by `settings`.
pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Ok(match settings.embedding_backend {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(
            &settings.ollama_url,
            settings.embedding_model.clone(),
            settings.generation_timeout(),
        )?),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use tempfile::TempDir;

    async fn hashing_assistant(dir: &TempDir, threshold: f32) -> Assistant {
        let index = Arc::new(
            EmbeddingIndex::open(
                dir.path(),
                DEFAULT_COLLECTION,
                Arc::new(HashingEmbedder::new(128)),
            )
            .unwrap(),
        );
        index
            .index(&[Document::new("holiday", "holiday calendar policy")])
            .await
            .unwrap();
        Assistant::new(index, Arc::new(TemplateComposer)).with_threshold(threshold)
    }

    #[tokio::test]
    async fn test_whitespace_query_is_rejected() {
        let dir = TempDir::new().unwrap();
        let assistant = hashing_assistant(&dir, 0.65).await;
        assert!(matches!(
            assistant.answer("   \n").await,
            Err(AssistantError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn test_pii_only_query_is_not_empty() {
        let dir = TempDir::new().unwrap();
        let assistant = hashing_assistant(&dir, 0.65).await;
        let answer = assistant.answer("EMP-12345").await.unwrap();
        assert_eq!(answer.outcome, Outcome::OutOfScope);
    }

    #[tokio::test]
    async fn test_exact_policy_text_is_answered() {
        let dir = TempDir::new().unwrap();
        let assistant = hashing_assistant(&dir, 0.65).await;
        let answer = assistant.answer("holiday calendar policy").await.unwrap();
        assert_eq!(answer.outcome, Outcome::Answered);
        assert!(answer.reply.contains("holiday calendar policy"));
        assert!(answer.reply.contains("(relevance 1.00)"));
    }

    #[tokio::test]
    async fn test_threshold_above_one_blocks_everything() {
        let dir = TempDir::new().unwrap();
        let assistant = hashing_assistant(&dir, 1.01).await;
        let answer = assistant.answer("holiday calendar policy").await.unwrap();
        assert_eq!(answer.outcome, Outcome::BelowThreshold);
    }

    #[test]
    fn test_from_settings_hashing_backend() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            index_path: dir.path().to_path_buf(),
            embedding_backend: EmbeddingBackend::Hashing,
            answer_strategy: AnswerStrategy::Generative,
            relevance_threshold: 0.7,
            ..Settings::default()
        };
        let assistant = Assistant::from_settings(&settings).unwrap();
        assert_eq!(assistant.threshold(), 0.7);
        assert!(assistant.index().is_empty());
    }
}
