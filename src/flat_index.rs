//! Brute-force flat index: O(n) k-NN search

use std::collections::HashMap;

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::index::Index;
use crate::vector::Vector;

/// A flat index that computes the distance to every stored embedding.
///
/// Policy collections hold tens to hundreds of entries, so exhaustive search
/// is exact and cheap.
#[derive(Debug)]
pub struct FlatIndex {
    vectors: HashMap<usize, Vector>,
    metric: DistanceMetric,
}

impl FlatIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            vectors: HashMap::new(),
            metric,
        }
    }
}

impl Index for FlatIndex {
    fn add(&mut self, id: usize, vector: Vector) -> Result<()> {
        self.vectors.insert(id, vector);
        Ok(())
    }

    fn remove(&mut self, id: usize) -> Result<()> {
        self.vectors.remove(&id);
        Ok(())
    }

    fn get_vector(&self, id: usize) -> Option<&Vector> {
        self.vectors.get(&id)
    }

    fn search(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f32)>> {
        let mut results: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|(&id, vec)| {
                let distance = self.metric.distance(query, vec)?;
                Ok((id, distance))
            })
            .collect::<Result<Vec<_>>>()?;

        // Equal distances fall back to insertion order so results are stable.
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        results.truncate(k);
        Ok(results)
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}
