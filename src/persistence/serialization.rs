//! Serialization utilities: bincode for embeddings, JSON for the manifest.

use crate::distance::DistanceMetric;
use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};

/// Serializable form of one indexed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedDocument {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Full collection state written at checkpoint time.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub documents: Vec<SerializedDocument>,
    pub dimension: Option<usize>,
}

/// Human-readable description of a collection, stored next to the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionManifest {
    pub name: String,
    pub metric: DistanceMetric,
    /// Identifier of the embedding model that produced the stored vectors.
    pub embedding_model: Option<String>,
    pub document_count: usize,
    pub dimension: Option<usize>,
}

pub fn to_bincode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| AssistantError::SerializationError(e.to_string()))
}

pub fn from_bincode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| AssistantError::SerializationError(e.to_string()))
}

pub fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| AssistantError::SerializationError(e.to_string()))
}

pub fn from_json<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| AssistantError::SerializationError(e.to_string()))
}
