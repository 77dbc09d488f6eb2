//! Scripted completion service for tests.
//!
//! Responses are matched by checking whether the user prompt contains a
//! registered substring (case-insensitive). Unmatched prompts get the default
//! response, or an error when none is set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CompletionRequest, CompletionService, LlmError};

#[derive(Debug, Default)]
pub struct FakeCompletionService {
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    error_status: Option<u16>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeCompletionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
        self
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Every call fails with an upstream error carrying `status`.
    pub fn with_error_status(mut self, status: u16) -> Self {
        self.error_status = Some(status);
        self
    }

    /// Sleeps before answering, to exercise deadlines.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for FakeCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.user.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(status) = self.error_status {
            return Err(LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            });
        }

        let prompt_lower = request.user.to_lowercase();
        for (pattern, response) in &self.responses {
            if prompt_lower.contains(pattern) {
                return Ok(response.clone());
            }
        }

        self.default_response.clone().ok_or(LlmError::EmptyContent)
    }
}
