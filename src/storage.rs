//! In-memory document collection

use crate::distance::DistanceMetric;
use crate::error::{AssistantError, Result};
use crate::flat_index::FlatIndex;
use crate::index::Index;
use crate::vector::Vector;
use std::collections::HashMap;

/// A nearest-neighbour hit: the document and its distance to the query
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub distance: f32,
}

/// Documents and their embeddings, searchable through a pluggable index.
#[derive(Debug)]
pub struct Collection<I: Index = FlatIndex> {
    index: I,
    /// Document ID -> internal ID
    id_to_internal: HashMap<String, usize>,
    /// Internal ID -> document ID
    internal_to_id: HashMap<usize, String>,
    /// Document text keyed by internal ID
    texts: HashMap<usize, String>,
    next_id: usize,
    /// Enforced embedding dimension, fixed by the first insert
    dimension: Option<usize>,
}

impl Collection<FlatIndex> {
    /// Create an empty collection backed by a brute-force flat index.
    pub fn new(metric: DistanceMetric) -> Self {
        Self::with_index(FlatIndex::new(metric))
    }
}

impl<I: Index> Collection<I> {
    pub fn with_index(index: I) -> Self {
        Self {
            index,
            id_to_internal: HashMap::new(),
            internal_to_id: HashMap::new(),
            texts: HashMap::new(),
            next_id: 0,
            dimension: None,
        }
    }

    /// Insert a document, replacing any previous entry with the same id.
    pub fn upsert(
        &mut self,
        id: impl Into<String>,
        text: impl Into<String>,
        embedding: Vector,
    ) -> Result<()> {
        let id = id.into();
        let dim = embedding.dimension();

        match self.dimension {
            Some(expected) if dim != expected => {
                return Err(AssistantError::DimensionMismatch {
                    expected,
                    actual: dim,
                });
            }
            Some(_) => {}
            None => self.dimension = Some(dim),
        }

        if let Some(&old_internal) = self.id_to_internal.get(&id) {
            self.index.remove(old_internal)?;
            self.texts.remove(&old_internal);
            self.internal_to_id.remove(&old_internal);
        }

        let internal_id = self.next_id;
        self.next_id += 1;

        self.index.add(internal_id, embedding)?;
        self.id_to_internal.insert(id.clone(), internal_id);
        self.internal_to_id.insert(internal_id, id);
        self.texts.insert(internal_id, text.into());

        Ok(())
    }

    /// Remove a document by id.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let internal_id = self
            .id_to_internal
            .remove(id)
            .ok_or_else(|| AssistantError::DocumentNotFound { id: id.to_string() })?;

        self.internal_to_id.remove(&internal_id);
        self.texts.remove(&internal_id);
        self.index.remove(internal_id)?;

        if self.id_to_internal.is_empty() {
            self.dimension = None;
        }
        Ok(())
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.id_to_internal
            .get(id)
            .and_then(|internal| self.texts.get(internal))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Search for the k nearest documents, closest first.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || k == 0 {
            return Ok(vec![]);
        }

        if let Some(expected) = self.dimension {
            if query.dimension() != expected {
                return Err(AssistantError::DimensionMismatch {
                    expected,
                    actual: query.dimension(),
                });
            }
        }

        let hits = self
            .index
            .search(query, k)?
            .into_iter()
            .filter_map(|(internal_id, distance)| {
                let id = self.internal_to_id.get(&internal_id)?;
                let text = self.texts.get(&internal_id)?;
                Some(SearchHit {
                    id: id.clone(),
                    text: text.clone(),
                    distance,
                })
            })
            .collect();

        Ok(hits)
    }

    /// All document ids, sorted.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.id_to_internal.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Iterate over `(document id, text, embedding)` for every entry.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &Vector)> + '_ {
        self.id_to_internal.iter().filter_map(move |(id, internal)| {
            let text = self.texts.get(internal)?;
            let vector = self.index.get_vector(*internal)?;
            Some((id.as_str(), text.as_str(), vector))
        })
    }

    pub fn metric(&self) -> DistanceMetric {
        self.index.metric()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
