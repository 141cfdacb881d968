//! Index trait for pluggable nearest-neighbour backends

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::vector::Vector;

/// A search index over embeddings keyed by internal id.
///
/// Implementations use `usize` internal IDs; the [`Collection`](crate::storage::Collection)
/// handles the document-id mapping and owns the document texts.
pub trait Index {
    /// Add a vector with the given internal ID.
    fn add(&mut self, id: usize, vector: Vector) -> Result<()>;

    /// Remove the vector with the given internal ID.
    fn remove(&mut self, id: usize) -> Result<()>;

    /// Search for the `k` nearest neighbors of `query`.
    /// Returns `(id, distance)` pairs sorted by distance ascending.
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f32)>>;

    /// Retrieve a vector by its internal ID.
    fn get_vector(&self, id: usize) -> Option<&Vector>;

    /// The distance metric used by this index.
    fn metric(&self) -> DistanceMetric;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
