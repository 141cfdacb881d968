//! Relevance gate: decide whether retrieved documents are good enough to answer from.

use crate::document::Retrieved;

/// Default minimum similarity of the top hit.
pub const DEFAULT_THRESHOLD: f32 = 0.65;

/// Outcome of gating a retrieval result.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Nothing was retrieved (empty collection or backend failure).
    NoMatch,
    /// The best hit is less similar than the threshold.
    BelowThreshold { top_similarity: f32 },
    /// The full ordered result set, best first.
    Usable(Vec<Retrieved>),
}

/// Gate `results` (sorted by descending similarity) against `threshold`.
///
/// Only the top entry is compared; lower-ranked entries are passed through
/// as they are, even if they fall below the threshold.
pub fn gate(results: Vec<Retrieved>, threshold: f32) -> Decision {
    match results.first() {
        None => Decision::NoMatch,
        Some(top) if top.similarity < threshold => Decision::BelowThreshold {
            top_similarity: top.similarity,
        },
        Some(_) => Decision::Usable(results),
    }
}
