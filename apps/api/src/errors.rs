use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::advisor::AdvisorError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Advisor(#[from] AdvisorError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// `Json` extractor whose rejections render as `AppError` bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
}

impl ErrorBody {
    fn new(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
            raw_response: None,
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::Advisor(e) => advisor_error_parts(e),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("DATABASE_ERROR", "A database error occurred"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("INTERNAL_ERROR", "An internal server error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn advisor_error_parts(error: AdvisorError) -> (StatusCode, ErrorBody) {
    match error {
        AdvisorError::InvalidInput(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("INVALID_INPUT", msg),
        ),
        AdvisorError::Upstream { status, message } => {
            tracing::error!("Completion service error (status {status:?}): {message}");
            (
                StatusCode::BAD_GATEWAY,
                ErrorBody::new("UPSTREAM_ERROR", "The recommendation service is unavailable")
                    .details("Please try again in a few moments."),
            )
        }
        AdvisorError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            ErrorBody::new("TIMEOUT", "The recommendation took too long")
                .details("Please try again."),
        ),
        AdvisorError::MalformedResponse { excerpt } => {
            tracing::error!("Unparseable completion output: {excerpt}");
            let mut body = ErrorBody::new("MALFORMED_RESPONSE", "Invalid response format from AI")
                .details("The AI response could not be parsed as valid JSON. Please try again.");
            body.raw_response = Some(excerpt);
            (StatusCode::BAD_GATEWAY, body)
        }
        AdvisorError::UnrecognizedShape => (
            StatusCode::BAD_GATEWAY,
            ErrorBody::new("UNRECOGNIZED_SHAPE", "Invalid response format from AI")
                .details("The AI response did not contain a usable recommendation. Please try again."),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_input_is_bad_request() {
        let response =
            AppError::from(AdvisorError::InvalidInput("query cannot be empty".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "INVALID_INPUT");
        assert_eq!(body["error"], "query cannot be empty");
        assert!(body.get("rawResponse").is_none());
    }

    #[tokio::test]
    async fn test_malformed_response_carries_excerpt() {
        let response = AppError::from(AdvisorError::MalformedResponse {
            excerpt: "Sorry, I".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["rawResponse"], "Sorry, I");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_upstream_hides_provider_message() {
        let response = AppError::from(AdvisorError::Upstream {
            status: Some(401),
            message: "Incorrect API key provided: sk-...".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(!body.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn test_timeout_is_gateway_timeout() {
        let response = AppError::from(AdvisorError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_json(response).await["code"], "TIMEOUT");
    }
}
