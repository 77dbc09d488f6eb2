//! Orchestrator: runs one recommendation request end to end.
//!
//! Stages: Idle → Validating → Prompting → Invoking → Parsing → Normalizing →
//! Done | Failed. Any stage failure is terminal and no partial result is
//! returned. Retries happen only inside the completion service.

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::advisor::categories::canonical_category;
use crate::advisor::normalize::{category_entry, normalize, UnrecognizedShape};
use crate::advisor::prompt_builder::{build_ideas_prompt, build_match_prompt, build_prompt};
use crate::advisor::repair::{excerpt, parse_completion, MalformedResponse};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{invoke, CompletionOptions, CompletionRequest, CompletionService, LlmError};
use crate::models::{CategoryRecommendation, DogProfile, DogProfileInput, InvalidProfile, Recommendation};

pub const MAX_QUERY_CHARS: usize = 200;
pub const MAX_BATCH_TITLES: usize = 10;
pub const MAX_IDEAS: usize = 3;

const IDEA_WRAPPER_KEYS: [&str; 2] = ["ideas", "products"];

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Completion service failed{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Completion service did not answer in time")]
    Timeout,

    #[error("Completion output could not be parsed as JSON")]
    MalformedResponse { excerpt: String },

    #[error("Completion output did not match an expected result shape")]
    UnrecognizedShape,
}

impl From<InvalidProfile> for AdvisorError {
    fn from(e: InvalidProfile) -> Self {
        AdvisorError::InvalidInput(e.to_string())
    }
}

impl From<LlmError> for AdvisorError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout(_) => AdvisorError::Timeout,
            LlmError::Api { status, message } => AdvisorError::Upstream {
                status: Some(status),
                message,
            },
            LlmError::Http(e) => AdvisorError::Upstream {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            LlmError::Parse(e) => AdvisorError::Upstream {
                status: None,
                message: format!("unreadable response envelope: {e}"),
            },
            LlmError::EmptyContent => AdvisorError::MalformedResponse {
                excerpt: String::new(),
            },
        }
    }
}

impl From<MalformedResponse> for AdvisorError {
    fn from(e: MalformedResponse) -> Self {
        AdvisorError::MalformedResponse { excerpt: e.excerpt }
    }
}

impl From<UnrecognizedShape> for AdvisorError {
    fn from(_: UnrecognizedShape) -> Self {
        AdvisorError::UnrecognizedShape
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Validating,
    Prompting,
    Invoking,
    Parsing,
    Normalizing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Validating => "validating",
            PipelineStage::Prompting => "prompting",
            PipelineStage::Invoking => "invoking",
            PipelineStage::Parsing => "parsing",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks the current stage of one request for logging.
struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!(from = %self.stage, to = %next, "pipeline transition");
        self.stage = next;
    }
}

/// Recommendation pipeline over an injected completion service.
#[derive(Clone)]
pub struct Advisor {
    service: Arc<dyn CompletionService>,
    options: CompletionOptions,
}

impl Advisor {
    pub fn new(service: Arc<dyn CompletionService>, options: CompletionOptions) -> Self {
        Self { service, options }
    }

    /// Scores a product, or recommends products for a category query.
    pub async fn recommend(
        &self,
        input: &DogProfileInput,
        query: &str,
    ) -> Result<Recommendation, AdvisorError> {
        let mut tracker = StageTracker::new();
        let result = self.run(&mut tracker, input, query).await;

        match &result {
            Ok(_) => tracker.advance(PipelineStage::Done),
            Err(e) => {
                warn!(stage = %tracker.stage, error = %e, "recommendation failed");
                tracker.advance(PipelineStage::Failed);
            }
        }

        result
    }

    async fn run(
        &self,
        tracker: &mut StageTracker,
        input: &DogProfileInput,
        query: &str,
    ) -> Result<Recommendation, AdvisorError> {
        tracker.advance(PipelineStage::Validating);
        let profile = input.validate()?;
        let query = validate_query(query)?;

        tracker.advance(PipelineStage::Prompting);
        let prompt = build_prompt(&profile, query);
        info!(
            "Recommending for {} ({:?} query: {query})",
            profile.name, prompt.kind
        );

        tracker.advance(PipelineStage::Invoking);
        let raw = self.complete(prompt.system, prompt.user).await?;
        debug!("Raw completion: {raw}");

        tracker.advance(PipelineStage::Parsing);
        let parsed = parse_completion(&raw)?;

        tracker.advance(PipelineStage::Normalizing);
        Ok(normalize(&parsed, prompt.kind)?)
    }

    /// Asks for up to `MAX_IDEAS` concrete product titles within a category.
    pub async fn suggest_titles(
        &self,
        input: &DogProfileInput,
        category: &str,
    ) -> Result<Vec<String>, AdvisorError> {
        let profile = input.validate()?;
        let category = validate_query(category)?;
        let category = canonical_category(category).unwrap_or(category);

        let raw = self
            .complete(JSON_ONLY_SYSTEM, build_ideas_prompt(&profile, category))
            .await?;
        let parsed = parse_completion(&raw)?;

        let titles = idea_titles(&parsed).ok_or(AdvisorError::UnrecognizedShape)?;
        if titles.is_empty() {
            return Err(AdvisorError::UnrecognizedShape);
        }
        Ok(titles)
    }

    /// Scores each title independently and concurrently.
    ///
    /// Output order matches input order. Any failed title fails the batch.
    pub async fn score_titles(
        &self,
        input: &DogProfileInput,
        titles: &[String],
    ) -> Result<Vec<CategoryRecommendation>, AdvisorError> {
        let profile = input.validate()?;
        let titles = validate_titles(titles)?;

        info!("Scoring {} product titles for {}", titles.len(), profile.name);

        try_join_all(titles.iter().map(|title| self.score_title(&profile, title))).await
    }

    async fn score_title(
        &self,
        profile: &DogProfile,
        title: &str,
    ) -> Result<CategoryRecommendation, AdvisorError> {
        let raw = self
            .complete(JSON_ONLY_SYSTEM, build_match_prompt(profile, title))
            .await?;
        let parsed = parse_completion(&raw)?;
        if !parsed.is_object() {
            warn!("Match score for '{title}' was not an object: {}", excerpt(&raw));
            return Err(AdvisorError::UnrecognizedShape);
        }

        let mut entry = category_entry(&parsed);
        entry.name = title.to_string();
        Ok(entry)
    }

    async fn complete(&self, system: &str, user: String) -> Result<String, AdvisorError> {
        let request = CompletionRequest {
            system: system.to_string(),
            user,
            options: self.options.clone(),
        };
        Ok(invoke(self.service.as_ref(), &request).await?)
    }
}

fn validate_query(query: &str) -> Result<&str, AdvisorError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AdvisorError::InvalidInput("query cannot be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(AdvisorError::InvalidInput(format!(
            "query cannot exceed {MAX_QUERY_CHARS} characters"
        )));
    }
    Ok(query)
}

fn validate_titles(titles: &[String]) -> Result<Vec<&str>, AdvisorError> {
    if titles.is_empty() || titles.len() > MAX_BATCH_TITLES {
        return Err(AdvisorError::InvalidInput(format!(
            "between 1 and {MAX_BATCH_TITLES} product titles are required"
        )));
    }
    titles.iter().map(|t| validate_query(t)).collect()
}

/// Accepts `["a", "b"]` or an object wrapping such an array.
fn idea_titles(value: &Value) -> Option<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => IDEA_WRAPPER_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };

    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .take(MAX_IDEAS)
            .map(str::to_string)
            .collect(),
    )
}
