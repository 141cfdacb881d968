//! Runtime settings, read from flags or the environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::error::{AssistantError, Result};
use crate::gate::DEFAULT_THRESHOLD;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "deepseek-coder:1.3b";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_INDEX_PATH: &str = "./hr_index";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// How a usable retrieval result becomes a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerStrategy {
    /// Return the best document with a relevance note.
    Template,
    /// Ask the language model, constrained to the retrieved documents.
    Generative,
}

/// Where embeddings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingBackend {
    /// Ollama `/api/embed` with `--embedding-model`.
    Ollama,
    /// Offline CRC32 feature hashing; `--embedding-model` is ignored.
    Hashing,
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Minimum similarity of the best document for it to be used.
    #[arg(long, env = "RELEVANCE_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub relevance_threshold: f32,

    /// Documents retrieved per question.
    #[arg(long, env = "HR_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Base URL of the Ollama server.
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Chat model for the generative strategy.
    #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_OLLAMA_MODEL)]
    pub ollama_model: String,

    /// Embedding model. Must be the same at seed time and at query time.
    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    #[arg(long, env = "EMBEDDING_BACKEND", value_enum, default_value_t = EmbeddingBackend::Ollama)]
    pub embedding_backend: EmbeddingBackend,

    /// Directory holding the persisted index.
    #[arg(long, env = "INDEX_PATH", default_value = DEFAULT_INDEX_PATH)]
    pub index_path: PathBuf,

    #[arg(long, env = "ANSWER_STRATEGY", value_enum, default_value_t = AnswerStrategy::Template)]
    pub answer_strategy: AnswerStrategy,

    /// Seconds before a generation request is abandoned.
    #[arg(long, env = "GENERATION_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub generation_timeout_secs: u64,

    /// Comma-separated topic keywords (defaults to the built-in HR list).
    #[arg(long, env = "HR_TOPIC_KEYWORDS", value_delimiter = ',')]
    pub topic_keywords: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            relevance_threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_backend: EmbeddingBackend::Ollama,
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            answer_strategy: AnswerStrategy::Template,
            generation_timeout_secs: DEFAULT_TIMEOUT_SECS,
            topic_keywords: Vec::new(),
        }
    }
}

impl Settings {
    /// Check that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if:
    /// - the threshold is not a finite number in [-1, 1]
    /// - `top_k == 0`
    /// - the generation timeout is zero
    pub fn validate(&self) -> Result<()> {
        let t = self.relevance_threshold;
        if !t.is_finite() || !(-1.0..=1.0).contains(&t) {
            return Err(AssistantError::Config(format!(
                "relevance_threshold ({t}) must be a number between -1 and 1"
            )));
        }
        if t < 0.3 {
            tracing::warn!(threshold = t, "relevance threshold is very low; weak matches will be answered");
        }
        if self.top_k == 0 {
            return Err(AssistantError::Config(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.generation_timeout_secs == 0 {
            return Err(AssistantError::Config(
                "generation_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.relevance_threshold, 0.65);
        assert_eq!(settings.generation_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_flags_parse() {
        let cli = TestCli::parse_from([
            "test",
            "--relevance-threshold",
            "0.7",
            "--answer-strategy",
            "generative",
            "--topic-keywords",
            "leave,pension",
        ]);
        assert_eq!(cli.settings.relevance_threshold, 0.7);
        assert_eq!(cli.settings.answer_strategy, AnswerStrategy::Generative);
        assert_eq!(cli.settings.topic_keywords, vec!["leave", "pension"]);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_threshold = Settings {
            relevance_threshold: f32::NAN,
            ..Settings::default()
        };
        assert!(matches!(bad_threshold.validate(), Err(AssistantError::Config(_))));

        let bad_k = Settings {
            top_k: 0,
            ..Settings::default()
        };
        assert!(bad_k.validate().is_err());

        let bad_timeout = Settings {
            generation_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(bad_timeout.validate().is_err());
    }
}
