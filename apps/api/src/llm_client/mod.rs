/// LLM Client: the single point of entry for completion-service calls.
///
/// No other module talks to the completion service over HTTP. Callers build a
/// `CompletionRequest`, hand it to `invoke`, and get the raw text back.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
pub mod fake;
pub mod prompts;

const BASE_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Completion did not finish within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Completion service returned empty content")]
    EmptyContent,
}

/// Per-call-site tuning of the completion service.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: String,
    /// Within [0, 1].
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Deadline for the whole call, retries included.
    pub timeout: Duration,
    /// Extra attempts after the first one, for transport-level failures only.
    pub max_retries: u32,
    /// Ask the service for `response_format: {type: "json_object"}`.
    pub json_mode: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.1,
            max_output_tokens: 1500,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            json_mode: false,
        }
    }
}

/// One system + user prompt pair, plus the options to send it with.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub options: CompletionOptions,
}

/// An opaque text-completion backend.
///
/// Implementations return the raw text of the first completion choice and
/// own their transport-level retry policy. Deadlines are enforced by `invoke`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Runs a completion against the request's deadline.
///
/// When the deadline fires first the in-flight future is dropped, which
/// aborts the underlying HTTP request as well.
pub async fn invoke(
    service: &dyn CompletionService,
    request: &CompletionRequest,
) -> Result<String, LlmError> {
    let deadline = request.options.timeout;
    match tokio::time::timeout(deadline, service.complete(request)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Completion timed out after {}ms", deadline.as_millis());
            Err(LlmError::Timeout(deadline))
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the content of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
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

/// HTTP client for an OpenAI-compatible chat completions endpoint.
/// Retries on transport errors, 429 and 5xx with exponential backoff.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()?,
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    /// Makes a raw call, returning the full response object.
    pub async fn call(&self, request: &CompletionRequest) -> Result<ChatResponse, LlmError> {
        let options = &request.options;
        let body = ChatRequest {
            model: &options.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
            response_format: options.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let attempts = options.max_retries + 1;
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = Duration::from_millis(BASE_BACKOFF_MS << (attempt - 1).min(6));
                warn!(
                    "Completion attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                warn!("Completion API returned {}: {}", status, text);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: text,
                });
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                    .map(|e| e.error.message)
                    .unwrap_or(text);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat: ChatResponse = serde_json::from_str(&response.text().await?)?;

            if let Some(usage) = &chat.usage {
                debug!(
                    "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(chat);
        }

        Err(last_error.unwrap_or(LlmError::EmptyContent))
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        response
            .text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Router};

    use super::fake::FakeCompletionService;
    use super::*;

    const OK_BODY: &str = r#"{"choices": [{"message": {"content": " {\"score\": 77} "}}]}"#;

    /// Answers with `statuses` in order, repeating the last one.
    struct ScriptedEndpoint {
        statuses: Vec<u16>,
        hits: AtomicUsize,
    }

    async fn scripted_reply(State(endpoint): State<Arc<ScriptedEndpoint>>) -> (StatusCode, String) {
        let hit = endpoint.hits.fetch_add(1, Ordering::SeqCst);
        let status = endpoint
            .statuses
            .get(hit)
            .or(endpoint.statuses.last())
            .copied()
            .unwrap_or(200);

        match status {
            200 => (StatusCode::OK, OK_BODY.to_string()),
            401 => (
                StatusCode::UNAUTHORIZED,
                r#"{"error": {"message": "Incorrect API key provided"}}"#.to_string(),
            ),
            other => (
                StatusCode::from_u16(other).unwrap(),
                "upstream unavailable".to_string(),
            ),
        }
    }

    async fn serve_scripted(statuses: &[u16]) -> (LlmClient, Arc<ScriptedEndpoint>) {
        let endpoint = Arc::new(ScriptedEndpoint {
            statuses: statuses.to_vec(),
            hits: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(scripted_reply))
            .with_state(endpoint.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = LlmClient::new("test-key".to_string(), &format!("http://{addr}/v1")).unwrap();
        (client, endpoint)
    }

    fn request_with_retries(max_retries: u32) -> CompletionRequest {
        CompletionRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            options: CompletionOptions {
                max_retries,
                ..CompletionOptions::default()
            },
        }
    }

    fn request_with_timeout(timeout: Duration) -> CompletionRequest {
        CompletionRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            options: CompletionOptions {
                timeout,
                ..CompletionOptions::default()
            },
        }
    }

    #[test]
    fn test_chat_request_omits_response_format_by_default() {
        let body = ChatRequest {
            model: "gpt-4",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.1,
            max_tokens: 10,
            response_format: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("response_format").is_none());
        assert_eq!(json["max_tokens"], 10);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_chat_request_json_mode_sets_response_format() {
        let body = ChatRequest {
            model: "gpt-4",
            messages: vec![],
            temperature: 0.0,
            max_tokens: 10,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_chat_response_text_reads_first_choice() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"score\": 80}"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5}
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), Some("{\"score\": 80}"));
    }

    #[test]
    fn test_chat_response_without_choices_has_no_text() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = LlmClient::new("key".to_string(), "http://localhost:9999/v1/").unwrap();
        assert_eq!(client.endpoint, "http://localhost:9999/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_invoke_returns_completion_text() {
        let service = FakeCompletionService::new().with_default_response("{\"score\": 1}");
        let text = invoke(&service, &request_with_timeout(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(text, "{\"score\": 1}");
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_times_out_slow_service() {
        let service = FakeCompletionService::new()
            .with_default_response("{\"score\": 1}")
            .with_delay(Duration::from_secs(60));
        let result = invoke(&service, &request_with_timeout(Duration::from_secs(10))).await;
        assert!(matches!(result, Err(LlmError::Timeout(d)) if d == Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_invoke_passes_service_errors_through() {
        let service = FakeCompletionService::new().with_error_status(503);
        let result = invoke(&service, &request_with_timeout(Duration::from_secs(5))).await;
        assert!(matches!(result, Err(LlmError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_success() {
        let (client, endpoint) = serve_scripted(&[503, 200]).await;
        let text = client.complete(&request_with_retries(3)).await.unwrap();
        assert_eq!(text, "{\"score\": 77}");
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let (client, endpoint) = serve_scripted(&[429, 200]).await;
        assert!(client.complete(&request_with_retries(2)).await.is_ok());
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_stop_after_max_retries() {
        let (client, endpoint) = serve_scripted(&[500]).await;
        let result = client.call(&request_with_retries(1)).await;
        assert!(matches!(result, Err(LlmError::Api { status: 500, .. })));
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (client, endpoint) = serve_scripted(&[401]).await;
        match client.call(&request_with_retries(3)).await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_error_surfaces_after_retries() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LlmClient::new("test-key".to_string(), &format!("http://{addr}/v1")).unwrap();
        let result = client.call(&request_with_retries(1)).await;
        assert!(matches!(result, Err(LlmError::Http(_))));
    }
}
