//! # HR Policy Assistant
//!
//! Answers HR-policy questions from a small set of indexed policy documents.
//!
//! Every question runs through the same pipeline:
//! - PII redaction (emails, SSN-shaped numbers, employee ids)
//! - a keyword topic filter
//! - embedding and nearest-neighbour search over a persistent collection
//! - a relevance gate on the best match
//! - a template or language-model answer
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hr_policy_assistant::{
//!     Assistant, EmbeddingIndex, HashingEmbedder, TemplateComposer, seed,
//! };
//!
//! # async fn run() -> hr_policy_assistant::Result<()> {
//! let index = Arc::new(EmbeddingIndex::open(
//!     "./hr_index",
//!     "hr_policies",
//!     Arc::new(HashingEmbedder::default()),
//! )?);
//! index.index(&seed::sample_documents()).await?;
//!
//! let assistant = Assistant::new(index, Arc::new(TemplateComposer));
//! let answer = assistant.answer("How many leave days do I get?").await?;
//! println!("{}", answer.reply);
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod config;
pub mod distance;
pub mod document;
pub mod embedding;
pub mod error;
pub mod flat_index;
pub mod gate;
pub mod index;
pub mod llm;
pub mod metrics;
pub mod persistence;
pub mod pipeline;
pub mod redact;
pub mod retriever;
pub mod seed;
pub mod server;
pub mod storage;
pub mod topic;
pub mod vector;

pub use compose::{AnswerComposer, GenerativeComposer, TemplateComposer};
pub use config::Settings;
pub use distance::DistanceMetric;
pub use document::{Document, Retrieved};
pub use embedding::{Embedder, HashingEmbedder, OllamaEmbedder};
pub use error::{AssistantError, Result};
pub use flat_index::FlatIndex;
pub use gate::{gate, Decision};
pub use index::Index;
pub use pipeline::{Answer, Assistant, Outcome};
pub use redact::redact;
pub use retriever::EmbeddingIndex;
pub use storage::Collection;
pub use topic::TopicFilter;
pub use vector::Vector;
