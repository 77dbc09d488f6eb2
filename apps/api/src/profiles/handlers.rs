//! Axum route handlers for dog profile CRUD.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{AppError, AppJson};
use crate::models::{DogProfileInput, StoredProfile};
use crate::state::AppState;

/// GET /api/v1/profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredProfile>>, AppError> {
    Ok(Json(state.profiles.list().await?))
}

/// POST /api/v1/profiles
pub async fn handle_create_profile(
    State(state): State<AppState>,
    AppJson(input): AppJson<DogProfileInput>,
) -> Result<(StatusCode, Json<StoredProfile>), AppError> {
    let profile = input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now();
    let stored = state
        .profiles
        .put(StoredProfile {
            id: Uuid::new_v4(),
            profile,
            created_at: now,
            updated_at: now,
        })
        .await?;

    tracing::info!("Created dog profile {} ({})", stored.id, stored.profile.name);
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredProfile>, AppError> {
    state
        .profiles
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Dog profile {id} not found")))
}

/// PUT /api/v1/profiles/:id
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<DogProfileInput>,
) -> Result<Json<StoredProfile>, AppError> {
    let profile = input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let existing = state
        .profiles
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Dog profile {id} not found")))?;

    let updated = state
        .profiles
        .put(StoredProfile {
            id,
            profile,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        })
        .await?;

    Ok(Json(updated))
}

/// DELETE /api/v1/profiles/:id
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.profiles.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Dog profile {id} not found")))
    }
}
