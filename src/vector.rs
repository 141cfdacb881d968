//! Embedding vector type

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};

/// A dense embedding in n-dimensional space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    /// Create a new vector from a Vec<f32>
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Build a vector from raw embedder output.
    ///
    /// Rejects empty, non-finite and all-zero data; a zero vector has no
    /// direction and cannot be compared by cosine distance.
    pub fn from_embedding(data: Vec<f32>) -> Result<Self> {
        if data.is_empty() {
            return Err(AssistantError::InvalidVector {
                reason: "embedding is empty".to_string(),
            });
        }
        if let Some(pos) = data.iter().position(|x| !x.is_finite()) {
            return Err(AssistantError::InvalidVector {
                reason: format!("non-finite component at position {}", pos),
            });
        }
        if data.iter().all(|&x| x == 0.0) {
            return Err(AssistantError::InvalidVector {
                reason: "embedding is all zeros".to_string(),
            });
        }
        Ok(Self { data })
    }

    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn has_same_dimension(&self, other: &Vector) -> bool {
        self.dimension() == other.dimension()
    }

    /// Compute the L2 norm (magnitude) of the vector
    pub fn norm(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Normalize the vector to unit length
    pub fn normalize(&mut self) -> Result<()> {
        let norm = self.norm();
        if norm == 0.0 {
            return Err(AssistantError::InvalidVector {
                reason: "Cannot normalize zero vector".to_string(),
            });
        }
        for x in &mut self.data {
            *x /= norm;
        }
        Ok(())
    }
}
