/// LLM Client: the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the LLM endpoint directly.
/// All LLM interactions MUST go through this module.
///
/// Speaks the OpenAI-compatible chat-completions protocol (Groq, OpenRouter and
/// friends). One POST per call, bounded by a fixed timeout, no retries: a
/// timeout, a non-2xx status or unparsable JSON is a hard failure.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 500;
/// Reasoning models sometimes wrap their answer as `\boxed{...}`.
const BOXED_MARKER: &str = "\\boxed";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM returned an unexpected JSON shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it carries any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The LLM client shared by all handlers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            api_url,
            model,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a single chat-completion call and returns the full response.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), %message, "LLM API returned an error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let chat: ChatResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &chat.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "LLM call succeeded"
            );
        }

        Ok(chat)
    }

    /// Calls the LLM and deserializes the cleaned text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let cleaned = clean_json_response(text);

        serde_json::from_str(cleaned).map_err(|e| {
            warn!(error = %e, raw = %text, "LLM response is not valid JSON");
            LlmError::Parse(e)
        })
    }

    fn classify(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            LlmError::Http(err)
        }
    }
}

/// Reduces raw model output to the JSON document it contains.
///
/// Drops everything up to and including a `\boxed` marker, strips Markdown
/// code fences, then cuts after the last `}` or `]` to shed trailing chatter.
pub fn clean_json_response(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(index) = text.find(BOXED_MARKER) {
        text = text[index + BOXED_MARKER.len()..].trim();
    }
    text = strip_json_fences(text);
    match text.rfind(['}', ']']) {
        Some(end) => &text[..=end],
        None => text,
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// A local chat-completions stand-in for tests that exercise the real client.
#[cfg(test)]
pub mod test_support {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serves `status` with an OpenAI-style body whose message content is `content`.
    pub async fn spawn_stub(status: StatusCode, content: &str) -> LlmClient {
        let body = if status.is_success() {
            json!({
                "choices": [{"message": {"role": "assistant", "content": content}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 34}
            })
        } else {
            json!({"error": {"message": content}})
        };
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(_req): Json<Value>| {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        client_for(app, Duration::from_secs(5)).await
    }

    /// Serves a handler that never answers within `timeout`.
    pub async fn spawn_stalled(timeout: Duration) -> LlmClient {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        );
        client_for(app, timeout).await
    }

    async fn client_for(app: Router, timeout: Duration) -> LlmClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        LlmClient::new(
            "test-key".to_string(),
            format!("http://{addr}/v1/chat/completions"),
            "test-model".to_string(),
            timeout,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{spawn_stalled, spawn_stub};
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_clean_drops_boxed_prefix() {
        let input = "<think>reasoning</think>\n\\boxed{\"questions\": [\"a\"]}";
        assert_eq!(clean_json_response(input), "{\"questions\": [\"a\"]}");
    }

    #[test]
    fn test_clean_truncates_trailing_chatter() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(clean_json_response(input), "{\"a\": 1}");
        let input = "[\"x\", \"y\"] Hope this helps!";
        assert_eq!(clean_json_response(input), "[\"x\", \"y\"]");
    }

    #[test]
    fn test_clean_without_json_is_left_alone() {
        assert_eq!(clean_json_response("  no json here "), "no json here");
    }

    #[tokio::test]
    async fn test_call_json_parses_fenced_content() {
        let client = spawn_stub(StatusCode::OK, "```json\n{\"hard_skills\": \"Rust\"}\n```").await;
        let value: Value = client.call_json("prompt", "system").await.unwrap();
        assert_eq!(value["hard_skills"], "Rust");
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let client = spawn_stub(StatusCode::TOO_MANY_REQUESTS, "slow down").await;
        let err = client.call("prompt", "system").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let client = spawn_stub(StatusCode::OK, "   ").await;
        let err = client.call_json::<Value>("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let client = spawn_stub(StatusCode::OK, "{not json}").await;
        let err = client.call_json::<Value>("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let client = spawn_stalled(Duration::from_millis(200)).await;
        let err = client.call("prompt", "system").await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { .. }), "got {err:?}");
    }
}
