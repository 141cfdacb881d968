//! Collection engine: combines WAL + snapshots for crash-safe persistence.

use crate::distance::DistanceMetric;
use crate::error::{AssistantError, Result};
use crate::persistence::serialization::{CollectionManifest, CollectionSnapshot, SerializedDocument};
use crate::persistence::snapshot::SnapshotManager;
use crate::persistence::wal::{WalEntry, WriteAheadLog};
use crate::storage::{Collection, SearchHit};
use crate::vector::Vector;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration for a persistent collection.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Checkpoint after this many WAL entries.
    pub checkpoint_interval: usize,
    /// Metric used when the collection is created. An existing collection
    /// keeps the metric recorded in its manifest.
    pub metric: DistanceMetric,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 1000,
            metric: DistanceMetric::Cosine,
        }
    }
}

/// A named, persistent collection stored under `<root>/<name>/`.
pub struct CollectionEngine {
    name: String,
    store: Collection,
    wal: WriteAheadLog,
    snapshot_mgr: SnapshotManager,
    dir: PathBuf,
    embedding_model: Option<String>,
    wal_count: usize,
    config: EngineConfig,
}

impl CollectionEngine {
    /// Open the collection `name` under `root`, creating it if absent.
    ///
    /// Opening never discards existing data: the snapshot is loaded and the
    /// WAL replayed on top of it.
    pub fn open(root: impl AsRef<Path>, name: &str, config: EngineConfig) -> Result<Self> {
        let dir = root.as_ref().join(name);
        let created = !dir.exists();
        std::fs::create_dir_all(&dir)?;

        let snapshot_mgr = SnapshotManager::new(&dir)?;
        let manifest = snapshot_mgr.load_manifest()?;

        let metric = match &manifest {
            Some(m) if m.metric != config.metric => {
                warn!(
                    collection = name,
                    stored = ?m.metric,
                    requested = ?config.metric,
                    "collection was created with a different metric, keeping the stored one"
                );
                m.metric
            }
            Some(m) => m.metric,
            None => config.metric,
        };
        let embedding_model = manifest.and_then(|m| m.embedding_model);

        let wal = WriteAheadLog::open(dir.join("wal.log"))?;
        let mut store = Collection::new(metric);

        if let Some(snapshot) = snapshot_mgr.load()? {
            Self::apply_snapshot(&mut store, &snapshot)?;
        }

        let entries = wal.replay()?;
        for entry in &entries {
            Self::apply_wal_entry(&mut store, entry)?;
        }

        let engine = Self {
            name: name.to_string(),
            store,
            wal,
            snapshot_mgr,
            dir,
            embedding_model,
            wal_count: entries.len(),
            config: EngineConfig { metric, ..config },
        };

        if created {
            engine.snapshot_mgr.save_manifest(&engine.manifest())?;
            info!(collection = name, path = %engine.dir.display(), "created collection");
        } else {
            debug!(
                collection = name,
                documents = engine.len(),
                replayed = engine.wal_count,
                "opened collection"
            );
        }

        Ok(engine)
    }

    fn apply_snapshot(store: &mut Collection, snapshot: &CollectionSnapshot) -> Result<()> {
        for doc in &snapshot.documents {
            if !doc.embedding.is_empty() {
                store.upsert(&doc.id, &doc.text, Vector::new(doc.embedding.clone()))?;
            }
        }
        Ok(())
    }

    fn apply_wal_entry(store: &mut Collection, entry: &WalEntry) -> Result<()> {
        match entry {
            WalEntry::Upsert {
                id,
                text,
                embedding,
            } => {
                store.upsert(id.as_str(), text.as_str(), Vector::new(embedding.clone()))?;
            }
            WalEntry::Delete { id } => {
                let _ = store.delete(id);
            }
            WalEntry::Checkpoint => {}
        }
        Ok(())
    }

    /// Insert or replace a document, writing to the WAL first.
    pub fn upsert(&mut self, id: &str, text: &str, embedding: Vector) -> Result<()> {
        // Reject bad dimensions before anything reaches the log.
        if let Some(expected) = self.store.dimension() {
            if embedding.dimension() != expected {
                return Err(AssistantError::DimensionMismatch {
                    expected,
                    actual: embedding.dimension(),
                });
            }
        }

        self.wal.append(&WalEntry::Upsert {
            id: id.to_string(),
            text: text.to_string(),
            embedding: embedding.as_slice().to_vec(),
        })?;

        self.store.upsert(id, text, embedding)?;
        self.wal_count += 1;
        self.maybe_checkpoint()
    }

    /// Delete a document, writing to the WAL first.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        if self.store.text(id).is_none() {
            return Err(AssistantError::DocumentNotFound { id: id.to_string() });
        }

        self.wal.append(&WalEntry::Delete { id: id.to_string() })?;
        self.store.delete(id)?;
        self.wal_count += 1;
        self.maybe_checkpoint()
    }

    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>> {
        self.store.search(query, k)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.store.list_ids()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric(&self) -> DistanceMetric {
        self.store.metric()
    }

    /// Embedding dimension of the stored documents, `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.store.dimension()
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    /// Record which embedding model produced the stored vectors.
    pub fn set_embedding_model(&mut self, model: &str) -> Result<()> {
        if self.embedding_model.as_deref() == Some(model) {
            return Ok(());
        }
        self.embedding_model = Some(model.to_string());
        self.snapshot_mgr.save_manifest(&self.manifest())
    }

    /// Force a checkpoint: snapshot + truncate WAL.
    pub fn checkpoint(&mut self) -> Result<()> {
        let snapshot = self.build_snapshot();
        self.snapshot_mgr.save(&snapshot, &self.manifest())?;

        self.wal.append(&WalEntry::Checkpoint)?;
        self.wal.truncate()?;
        self.wal_count = 0;

        debug!(collection = %self.name, documents = snapshot.documents.len(), "checkpoint written");
        Ok(())
    }

    fn maybe_checkpoint(&mut self) -> Result<()> {
        if self.wal_count >= self.config.checkpoint_interval {
            self.checkpoint()?;
        }
        Ok(())
    }

    pub fn manifest(&self) -> CollectionManifest {
        CollectionManifest {
            name: self.name.clone(),
            metric: self.store.metric(),
            embedding_model: self.embedding_model.clone(),
            document_count: self.store.len(),
            dimension: self.store.dimension(),
        }
    }

    fn build_snapshot(&self) -> CollectionSnapshot {
        let mut documents: Vec<SerializedDocument> = self
            .store
            .entries()
            .map(|(id, text, vector)| SerializedDocument {
                id: id.to_string(),
                text: text.to_string(),
                embedding: vector.as_slice().to_vec(),
            })
            .collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));

        CollectionSnapshot {
            documents,
            dimension: self.store.dimension(),
        }
    }
}
