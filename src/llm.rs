//! Client for the Ollama chat API used by the generative answer strategy.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default request timeout for a chat completion.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for the startup availability check.
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Sampling options sent with every chat request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub temperature: f32,
    /// Maximum number of generated tokens.
    pub num_predict: u32,
    pub top_k: u32,
    pub top_p: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            num_predict: 150,
            top_k: 20,
            top_p: 0.9,
        }
    }
}

/// How a single chat call failed.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("cannot connect to {url}: {message}")]
    Unavailable { url: String, message: String },

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Non-streaming chat client. One attempt per call, no retries.
///
/// The underlying `reqwest::Client` pools connections and is safe to share;
/// concurrent calls do not wait on each other.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
    options: SamplingOptions,
}

impl ChatClient {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
            options: SamplingOptions::default(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Send one system + user exchange and return the assistant's text.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, ChatError> {
        let url = self.chat_url();
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            options: self.options,
        };

        debug!(model = %self.model, url = %url, "sending chat request");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let content = parsed.message.content.trim().to_string();
        if content.is_empty() {
            return Err(ChatError::Other("model returned an empty answer".to_string()));
        }
        Ok(content)
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> ChatError {
        if e.is_timeout() {
            ChatError::Timeout(self.timeout)
        } else if e.is_connect() {
            ChatError::Unavailable {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            ChatError::Other(e.to_string())
        }
    }

    /// Ask the server which models it has and log the result. Never fails.
    pub async fn check_availability(&self) {
        let url = format!("{}/api/tags", self.base_url);
        let result = self.client.get(&url).timeout(AVAILABILITY_TIMEOUT).send().await;

        match result {
            Ok(resp) if resp.status().is_success() => match resp.json::<TagsResponse>().await {
                Ok(tags) => {
                    let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
                    if !names.iter().any(|n| n == &self.model) {
                        warn!(model = %self.model, available = ?names, "configured model not listed by server");
                    } else {
                        info!(available = ?names, "generation service reachable");
                    }
                }
                Err(e) => warn!(error = %e, "generation service returned an unreadable model list"),
            },
            Ok(resp) => warn!(status = %resp.status(), "generation service is running but returned an error"),
            Err(e) => warn!(url = %url, error = %e, "cannot reach generation service"),
        }
    }
}
