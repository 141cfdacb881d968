//! Policy documents and retrieval results

use serde::{Deserialize, Serialize};

/// A reference document. Identity is the `id`; indexing the same id again
/// replaces the stored text and embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One entry of a retrieval result, ordered by descending `similarity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retrieved {
    pub id: String,
    pub text: String,
    pub similarity: f32,
}
