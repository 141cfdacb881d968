//! Embedding index: embed documents and queries, search the persistent collection.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::document::{Document, Retrieved};
use crate::embedding::Embedder;
use crate::error::{AssistantError, Result};
use crate::persistence::{CollectionEngine, EngineConfig};
use crate::vector::Vector;

/// Name of the single collection holding HR policy documents.
pub const DEFAULT_COLLECTION: &str = "hr_policies";

/// A document collection paired with the embedder that fills and queries it.
///
/// Shared across request handlers; queries take a read lock and indexing a
/// write lock. Embedding happens before any lock is taken.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    collection: RwLock<CollectionEngine>,
}

impl EmbeddingIndex {
    /// Open (or create) `collection` under `path`.
    pub fn open(
        path: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let engine = CollectionEngine::open(path, collection, EngineConfig::default())?;

        if let Some(stored) = engine.embedding_model() {
            if stored != embedder.model_id() {
                warn!(
                    collection,
                    stored_model = stored,
                    query_model = embedder.model_id(),
                    "collection was indexed with a different embedding model; similarities will be unreliable"
                );
            }
        }

        Ok(Self {
            embedder,
            collection: RwLock::new(engine),
        })
    }

    /// Embed all documents in one batch and upsert them.
    ///
    /// Re-indexing an existing id replaces its text and embedding, so seeding
    /// twice is harmless. Returns the number of documents written.
    pub async fn index(&self, documents: &[Document]) -> Result<usize> {
        if documents.is_empty() {
            warn!("index called with no documents, nothing written");
            return Ok(0);
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(AssistantError::Embedding {
                provider: self.embedder.model_id().to_string(),
                message: format!(
                    "returned {} embeddings for {} documents",
                    embeddings.len(),
                    documents.len()
                ),
            });
        }

        let vectors = embeddings
            .into_iter()
            .map(Vector::from_embedding)
            .collect::<Result<Vec<_>>>()?;

        let mut engine = self
            .collection
            .write()
            .map_err(|_| AssistantError::StorageError("collection lock poisoned".to_string()))?;

        // The whole batch must fit the collection before anything is logged.
        if let Some(expected) = engine
            .dimension()
            .or_else(|| vectors.first().map(Vector::dimension))
        {
            if let Some(bad) = vectors.iter().find(|v| v.dimension() != expected) {
                return Err(AssistantError::DimensionMismatch {
                    expected,
                    actual: bad.dimension(),
                });
            }
        }

        for (doc, vector) in documents.iter().zip(vectors) {
            engine.upsert(&doc.id, &doc.text, vector)?;
        }
        engine.set_embedding_model(self.embedder.model_id())?;

        info!(
            collection = engine.name(),
            indexed = documents.len(),
            total = engine.len(),
            "indexed documents"
        );
        Ok(documents.len())
    }

    /// Return up to `k` documents closest to `text`, most similar first.
    ///
    /// Never fails: an empty collection, an embedding error, a malformed
    /// embedding, or a storage error all yield an empty result, which callers
    /// treat as "no relevant documents".
    pub async fn query(&self, text: &str, k: usize) -> Vec<Retrieved> {
        match self.try_query(text, k).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "retrieval failed, treating as no match");
                Vec::new()
            }
        }
    }

    async fn try_query(&self, text: &str, k: usize) -> Result<Vec<Retrieved>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = Vector::from_embedding(self.embedder.embed(text).await?)?;

        let engine = self
            .collection
            .read()
            .map_err(|_| AssistantError::StorageError("collection lock poisoned".to_string()))?;
        let metric = engine.metric();

        let mut results: Vec<Retrieved> = engine
            .search(&embedding, k)?
            .into_iter()
            .map(|hit| Retrieved {
                id: hit.id,
                text: hit.text,
                similarity: metric.similarity(hit.distance),
            })
            .collect();
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        debug!(
            hits = results.len(),
            top = results.first().map(|r| r.similarity),
            "retrieved documents"
        );
        Ok(results)
    }

    /// Remove a document by id.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.collection
            .write()
            .map_err(|_| AssistantError::StorageError("collection lock poisoned".to_string()))?
            .delete(id)
    }

    /// Write a snapshot and truncate the WAL.
    pub fn checkpoint(&self) -> Result<()> {
        self.collection
            .write()
            .map_err(|_| AssistantError::StorageError("collection lock poisoned".to_string()))?
            .checkpoint()
    }

    pub fn len(&self) -> usize {
        self.collection.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.collection
            .read()
            .map(|c| c.list_ids())
            .unwrap_or_default()
    }

    pub fn collection_name(&self) -> String {
        self.collection
            .read()
            .map(|c| c.name().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct BrokenEmbedder;

    /// Returns a vector one component longer for each successive text.
    struct RaggedEmbedder;

    #[async_trait]
    impl Embedder for RaggedEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok((0..texts.len()).map(|i| vec![1.0; i + 2]).collect())
        }

        fn model_id(&self) -> &str {
            "ragged"
        }
    }

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![])
        }

        fn model_id(&self) -> &str {
            "broken"
        }
    }

    fn hashing_index(dir: &TempDir) -> EmbeddingIndex {
        EmbeddingIndex::open(
            dir.path(),
            DEFAULT_COLLECTION,
            Arc::new(HashingEmbedder::new(128)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_empty_index_returns_nothing() {
        let dir = TempDir::new().unwrap();
        let index = hashing_index(&dir);
        assert!(index.query("annual leave", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_exact_text_is_top_hit() {
        let dir = TempDir::new().unwrap();
        let index = hashing_index(&dir);
        index
            .index(&[
                Document::new("leave", "annual leave paid days"),
                Document::new("overtime", "overtime pay beyond forty hours"),
            ])
            .await
            .unwrap();

        let results = index.query("overtime pay beyond forty hours", 2).await;
        assert_eq!(results[0].id, "overtime");
        assert!((results[0].similarity - 1.0).abs() < 1e-5);
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_reindex_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let index = hashing_index(&dir);
        let docs = [Document::new("leave", "annual leave")];

        index.index(&docs).await.unwrap();
        index.index(&docs).await.unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_index_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let index = hashing_index(&dir);
            index
                .index(&[Document::new("leave", "annual leave")])
                .await
                .unwrap();
        }
        let index = hashing_index(&dir);
        assert_eq!(index.list_ids(), vec!["leave".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_embedder_is_absorbed_by_query_but_not_index() {
        let dir = TempDir::new().unwrap();
        {
            let seeded = hashing_index(&dir);
            seeded
                .index(&[Document::new("leave", "annual leave")])
                .await
                .unwrap();
        }

        let index =
            EmbeddingIndex::open(dir.path(), DEFAULT_COLLECTION, Arc::new(BrokenEmbedder)).unwrap();
        assert!(index.query("annual leave", 3).await.is_empty());
        assert!(index
            .index(&[Document::new("overtime", "overtime")])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_mixed_dimensions_write_nothing() {
        let dir = TempDir::new().unwrap();
        {
            let index =
                EmbeddingIndex::open(dir.path(), DEFAULT_COLLECTION, Arc::new(RaggedEmbedder))
                    .unwrap();
            let result = index
                .index(&[
                    Document::new("leave", "annual leave"),
                    Document::new("overtime", "overtime"),
                ])
                .await;

            assert!(matches!(
                result,
                Err(AssistantError::DimensionMismatch {
                    expected: 2,
                    actual: 3
                })
            ));
            assert!(index.is_empty());
        }

        // Nothing reached the WAL either.
        assert!(hashing_index(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_batch_must_match_stored_dimension() {
        let dir = TempDir::new().unwrap();
        hashing_index(&dir)
            .index(&[Document::new("leave", "annual leave")])
            .await
            .unwrap();

        let narrower =
            EmbeddingIndex::open(dir.path(), DEFAULT_COLLECTION, Arc::new(HashingEmbedder::new(64)))
                .unwrap();
        let result = narrower
            .index(&[Document::new("overtime", "overtime pay")])
            .await;

        assert!(matches!(
            result,
            Err(AssistantError::DimensionMismatch {
                expected: 128,
                actual: 64
            })
        ));
        assert_eq!(narrower.list_ids(), vec!["leave".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let dir = TempDir::new().unwrap();
        let index = hashing_index(&dir);
        assert_eq!(index.index(&[]).await.unwrap(), 0);
    }
}
