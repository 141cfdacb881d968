//! Answer composition: turn a gate decision into the reply text.

use async_trait::async_trait;
use tracing::warn;

use crate::document::Retrieved;
use crate::gate::Decision;
use crate::llm::{ChatClient, ChatError};
use crate::redact::redact;

pub const NO_MATCH_REPLY: &str = "No relevant HR documents found. Please contact HR.";

pub const BELOW_THRESHOLD_REPLY: &str =
    "I can only answer questions that match official HR policies. Please rephrase or contact HR.";

pub const TIMEOUT_REPLY: &str =
    "Error: The AI service is taking too long to respond. Please try again.";

pub const UNAVAILABLE_REPLY: &str =
    "Error: Cannot connect to the AI service. Please try again later or contact HR directly.";

const SYSTEM_PROMPT: &str = "You are a professional HR assistant. Your role is STRICTLY LIMITED to answering questions based on the provided HR policy documents.

IMPORTANT RULES:
1. ONLY answer questions related to HR policies about leaves, overtime, compensation, salary, working hours, holidays, and company policies
2. If the question is outside HR topics, politely decline to answer
3. Base your answers ONLY on the provided context documents - do not use external knowledge
4. If the context doesn't contain relevant information, say you cannot answer from available policies
5. Keep responses professional, concise, and helpful (2-3 sentences maximum)
6. NEVER make up information or speculate beyond the provided context
7. If unsure, direct the user to contact HR directly

Context from HR Policy Documents:
";

/// Builds a reply from documents that passed the relevance gate.
///
/// Implementations never fail: every problem is turned into reply text.
#[async_trait]
pub trait AnswerComposer: Send + Sync {
    /// `results` is non-empty and ordered best first.
    async fn answer(&self, query: &str, results: &[Retrieved]) -> String;

    fn name(&self) -> &'static str;

    /// Check that any upstream service is reachable and log the result.
    async fn check_availability(&self) {}
}

/// Map a gate decision to the reply shown to the user.
pub async fn compose(composer: &dyn AnswerComposer, query: &str, decision: Decision) -> String {
    match decision {
        Decision::NoMatch => NO_MATCH_REPLY.to_string(),
        Decision::BelowThreshold { .. } => BELOW_THRESHOLD_REPLY.to_string(),
        Decision::Usable(results) => composer.answer(query, &results).await,
    }
}

/// Returns the best document verbatim with a relevance disclosure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateComposer;

#[async_trait]
impl AnswerComposer for TemplateComposer {
    async fn answer(&self, _query: &str, results: &[Retrieved]) -> String {
        match results.first() {
            Some(top) => format!(
                "Based on our HR policy documents (relevance {:.2}):\n\n{}\n\nIf this doesn't answer your question, contact HR directly.",
                top.similarity, top.text
            ),
            None => NO_MATCH_REPLY.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

/// Asks a language model to answer strictly from the retrieved documents.
#[derive(Debug, Clone)]
pub struct GenerativeComposer {
    client: ChatClient,
}

impl GenerativeComposer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

/// All retrieved texts in rank order, separated by a blank line.
pub fn build_context(results: &[Retrieved]) -> String {
    results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Reply text for a failed generation call.
pub fn failure_reply(error: &ChatError) -> String {
    match error {
        ChatError::Timeout(_) => TIMEOUT_REPLY.to_string(),
        ChatError::Unavailable { .. } => UNAVAILABLE_REPLY.to_string(),
        ChatError::Status { status } => format!(
            "Error: Unable to generate response. Status code: {status}. Please contact HR directly."
        ),
        // Upstream error text can echo the question back.
        ChatError::Other(message) => {
            format!("Error: An unexpected error occurred - {}", redact(message))
        }
    }
}

#[async_trait]
impl AnswerComposer for GenerativeComposer {
    async fn answer(&self, query: &str, results: &[Retrieved]) -> String {
        let system = format!("{SYSTEM_PROMPT}{}", build_context(results));

        match self.client.chat(&system, query).await {
            Ok(text) => redact(&text),
            Err(e) => {
                warn!(error = %redact(&e.to_string()), model = self.client.model(), "generation failed");
                failure_reply(&e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "generative"
    }

    async fn check_availability(&self) {
        self.client.check_availability().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn hit(text: &str, similarity: f32) -> Retrieved {
        Retrieved {
            id: text.to_lowercase(),
            text: text.to_string(),
            similarity,
        }
    }

    #[tokio::test]
    async fn test_fixed_replies() {
        let composer = TemplateComposer;
        assert_eq!(compose(&composer, "q", Decision::NoMatch).await, NO_MATCH_REPLY);
        assert_eq!(
            compose(&composer, "q", Decision::BelowThreshold { top_similarity: 0.1 }).await,
            BELOW_THRESHOLD_REPLY
        );
    }

    #[tokio::test]
    async fn test_template_uses_top_document_only() {
        let results = vec![hit("Annual leave: 20 days.", 0.8765), hit("Overtime at 1.5x.", 0.7)];
        let reply = compose(&TemplateComposer, "leave?", Decision::Usable(results)).await;

        assert!(reply.contains("Annual leave: 20 days."));
        assert!(reply.contains("(relevance 0.88)"));
        assert!(!reply.contains("Overtime"));
        assert!(reply.ends_with("contact HR directly."));
    }

    #[test]
    fn test_context_joins_in_rank_order() {
        let context = build_context(&[hit("first", 0.9), hit("second", 0.8)]);
        assert_eq!(context, "first\n\nsecond");
    }

    #[test]
    fn test_failure_replies() {
        assert_eq!(failure_reply(&ChatError::Timeout(Duration::from_secs(15))), TIMEOUT_REPLY);
        assert_eq!(
            failure_reply(&ChatError::Unavailable {
                url: "http://x".into(),
                message: "refused".into()
            }),
            UNAVAILABLE_REPLY
        );
        assert!(failure_reply(&ChatError::Status { status: 503 }).contains("503"));
    }

    #[test]
    fn test_unexpected_error_text_is_redacted() {
        let reply = failure_reply(&ChatError::Other(
            "bad input from EMP-4411 <bob@corp.com>".to_string(),
        ));
        assert!(reply.starts_with("Error: An unexpected error occurred - "));
        assert!(!reply.contains("EMP-4411"));
        assert!(!reply.contains("bob@corp.com"));
        assert!(reply.contains("[REDACTED]"));
    }
}
