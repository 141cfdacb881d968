//! Distance metrics and the distance-to-similarity conversion

use crate::error::{AssistantError, Result};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// Distance metrics for measuring embedding closeness.
///
/// Lower distance always means closer. Relevance decisions work on
/// similarity instead, so every metric also defines how its distance maps
/// back to a similarity score (see [`DistanceMetric::similarity`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceMetric {
    /// Cosine distance: 1 - cosine similarity, in [0, 2]
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
    /// Dot product (negated for minimum distance)
    DotProduct,
}

impl DistanceMetric {
    /// Compute the distance between two vectors using this metric
    pub fn distance(&self, v1: &Vector, v2: &Vector) -> Result<f32> {
        if !v1.has_same_dimension(v2) {
            return Err(AssistantError::DimensionMismatch {
                expected: v1.dimension(),
                actual: v2.dimension(),
            });
        }

        match self {
            DistanceMetric::Cosine => cosine_distance(v1, v2),
            DistanceMetric::Euclidean => Ok(euclidean_distance(v1, v2)),
            DistanceMetric::DotProduct => Ok(-dot_product(v1, v2)),
        }
    }

    /// Convert a distance produced by this metric into a similarity score.
    ///
    /// The conversion is monotonic decreasing for every metric:
    ///
    /// - `Cosine`: `1 - d`, which recovers cosine similarity in [-1, 1].
    /// - `Euclidean`: `1 - d² / 2`, which equals cosine similarity only when
    ///   both vectors are unit length. Un-normalized embeddings give scores
    ///   that are still ordered correctly but not bounded.
    /// - `DotProduct`: `-d`, the raw dot product.
    pub fn similarity(&self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - distance,
            DistanceMetric::Euclidean => 1.0 - distance * distance / 2.0,
            DistanceMetric::DotProduct => -distance,
        }
    }
}

/// Compute Euclidean (L2) distance between two vectors
pub fn euclidean_distance(v1: &Vector, v2: &Vector) -> f32 {
    v1.as_slice()
        .iter()
        .zip(v2.as_slice().iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Compute cosine distance between two vectors (1 - cosine similarity)
pub fn cosine_distance(v1: &Vector, v2: &Vector) -> Result<f32> {
    let norm1 = v1.norm();
    let norm2 = v2.norm();

    if norm1 == 0.0 || norm2 == 0.0 {
        return Err(AssistantError::InvalidVector {
            reason: "Cannot compute cosine distance with zero vector".to_string(),
        });
    }

    let similarity = (dot_product(v1, v2) / (norm1 * norm2)).clamp(-1.0, 1.0);
    Ok(1.0 - similarity)
}

/// Compute dot product of two vectors
pub fn dot_product(v1: &Vector, v2: &Vector) -> f32 {
    v1.as_slice()
        .iter()
        .zip(v2.as_slice().iter())
        .map(|(a, b)| a * b)
        .sum()
}
