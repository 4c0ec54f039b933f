//! AI analysis client for paper summarization and Q&A.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint (DeepSeek by
//! default). Structured analyses are requested in JSON mode and parsed
//! leniently: any transport, auth, or parse failure is a soft failure
//! (`None` / fallback answer), never an error surfaced to the workflow.

mod prompts;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use prompts::QNA_FALLBACK_ANSWER;

use crate::models::AnalysisKind;

/// Errors internal to the LLM client. Public methods translate these
/// into soft failures.
#[derive(Debug, Error)]
enum LlmError {
    #[error("no API key configured")]
    MissingKey,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Configuration for the analysis client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions base URL (OpenAI-compatible).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Default API key; per-user keys override it per call.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum abstract length sent to the model.
    #[serde(default = "default_max_abstract_chars")]
    pub max_abstract_chars: usize,
}

fn default_endpoint() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_abstract_chars() -> usize {
    8000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_abstract_chars: default_max_abstract_chars(),
        }
    }
}

/// Chat-completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

/// Chat-completions response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// AI analysis client.
pub struct AnalysisClient {
    config: LlmConfig,
    client: Client,
}

impl AnalysisClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self { config, client }
    }

    /// Request a structured analysis of an abstract.
    ///
    /// Returns `None` on any failure; the caller skips persisting that
    /// analysis kind. The model's JSON is not validated beyond being a
    /// JSON object, so a half-useful payload is stored as-is.
    pub async fn structured_analyze(
        &self,
        kind: AnalysisKind,
        abstract_text: &str,
        key_override: Option<&str>,
    ) -> Option<serde_json::Value> {
        let prompt = format!(
            "{}{}",
            prompts::analysis_prompt(kind),
            self.truncate(abstract_text)
        );

        let content = match self
            .chat(
                vec![
                    ChatMessage {
                        role: "system",
                        content: prompts::JSON_SYSTEM_PROMPT,
                    },
                    ChatMessage {
                        role: "user",
                        content: &prompt,
                    },
                ],
                true,
                key_override,
            )
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!("{} analysis call failed: {}", kind.as_str(), e);
                return None;
            }
        };

        match parse_json_object(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} analysis returned unparsable JSON: {}", kind.as_str(), e);
                None
            }
        }
    }

    /// Answer a question against article context.
    ///
    /// Never fails: any error yields a fixed apology answer.
    pub async fn answer_with_context(
        &self,
        question: &str,
        context: &str,
        key_override: Option<&str>,
    ) -> String {
        let prompt = prompts::qna_prompt(question, self.truncate(context));

        match self
            .chat(
                vec![ChatMessage {
                    role: "user",
                    content: &prompt,
                }],
                false,
                key_override,
            )
            .await
        {
            Ok(answer) => answer.trim().to_string(),
            Err(e) => {
                warn!("Q&A call failed: {}", e);
                QNA_FALLBACK_ANSWER.to_string()
            }
        }
    }

    /// Truncate text to the configured maximum (UTF-8 safe).
    fn truncate<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_abstract_chars {
            return text;
        }
        let mut end = self.config.max_abstract_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Call the chat-completions endpoint.
    async fn chat(
        &self,
        messages: Vec<ChatMessage<'_>>,
        json_mode: bool,
        key_override: Option<&str>,
    ) -> Result<String, LlmError> {
        let api_key = key_override
            .or(self.config.api_key.as_deref())
            .ok_or(LlmError::MissingKey)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let url = format!("{}/chat/completions", self.config.endpoint);
        debug!("LLM request to {} (json_mode={})", url, json_mode);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("response has no choices".to_string()))
    }
}

/// Parse a model reply as a JSON object, tolerating markdown fences.
fn parse_json_object(content: &str) -> Result<serde_json::Value, String> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: serde_json::Value =
        serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(format!("expected JSON object, got {}", value))
    }
}
