//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hr_policy_assistant::{
    seed, Assistant, Embedder, EmbeddingIndex, Result, TemplateComposer,
};
use tempfile::TempDir;

/// Vocabulary axes. Each dimension counts occurrences of one stem.
const AXES: &[&str] = &[
    "leave",
    "days",
    "annual",
    "paid",
    "overtime",
    "hours",
    "compensat",
    "bonus",
    "salary",
    "review",
    "performance",
    "policy",
    "holiday",
];

/// Small constant component so no text embeds to the zero vector.
const BIAS: f32 = 0.01;

/// Deterministic bag-of-stems embedder that counts how often it is called.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = AXES
            .iter()
            .map(|stem| lower.matches(stem).count() as f32)
            .collect();
        v.push(BIAS);
        v
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn model_id(&self) -> &str {
        "keyword-test"
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub embedder: Arc<KeywordEmbedder>,
    pub index: Arc<EmbeddingIndex>,
}

/// An index over a fresh temp directory, optionally filled with the sample policies.
pub async fn fixture(seeded: bool) -> Fixture {
    let dir = TempDir::new().unwrap();
    let embedder = Arc::new(KeywordEmbedder::default());
    let index = Arc::new(
        EmbeddingIndex::open(dir.path(), "hr_policies", embedder.clone()).unwrap(),
    );
    if seeded {
        index.index(&seed::sample_documents()).await.unwrap();
    }
    Fixture {
        dir,
        embedder,
        index,
    }
}

pub fn template_assistant(index: Arc<EmbeddingIndex>) -> Assistant {
    Assistant::new(index, Arc::new(TemplateComposer))
}
