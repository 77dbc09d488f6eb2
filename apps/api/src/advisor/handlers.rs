//! Axum route handlers for the recommendation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::advisor::categories::PRODUCT_CATEGORIES;
use crate::advisor::AdvisorError;
use crate::errors::{AppError, AppJson};
use crate::models::{CategoryRecommendation, DogProfileInput, Recommendation};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Either an inline profile or the id of a stored one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSource {
    #[serde(default)]
    pub dog_profile: Option<DogProfileInput>,
    #[serde(default)]
    pub profile_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(flatten)]
    pub source: ProfileSource,
    #[serde(default, alias = "product")]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdeasRequest {
    #[serde(flatten)]
    pub source: ProfileSource,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IdeasResponse {
    pub ideas: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreProductsRequest {
    #[serde(flatten)]
    pub source: ProfileSource,
    #[serde(default)]
    pub ideas: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub items_per_page: usize,
}

#[derive(Debug, Serialize)]
pub struct ScoreProductsResponse {
    pub recommendations: Vec<CategoryRecommendation>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<&'static str>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/categories
pub async fn handle_list_categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: PRODUCT_CATEGORIES.to_vec(),
    })
}

/// POST /api/v1/recommend
///
/// Scores a named product, or lists recommendations when the query is a
/// known category. Category entries always carry an affiliate link.
pub async fn handle_recommend(
    State(state): State<AppState>,
    AppJson(request): AppJson<RecommendRequest>,
) -> Result<Json<Recommendation>, AppError> {
    let profile = resolve_profile(&state, request.source).await?;
    let query = request.query.unwrap_or_default();

    let mut recommendation = state.advisor.recommend(&profile, &query).await?;
    if let Recommendation::Category { recommendations } = &mut recommendation {
        state.links.attach(recommendations);
    }

    Ok(Json(recommendation))
}

/// POST /api/v1/recommend/ideas
///
/// Suggests concrete product titles within a category.
pub async fn handle_suggest_ideas(
    State(state): State<AppState>,
    AppJson(request): AppJson<IdeasRequest>,
) -> Result<Json<IdeasResponse>, AppError> {
    let profile = resolve_profile(&state, request.source).await?;
    let query = request.query.unwrap_or_default();

    let ideas = state.advisor.suggest_titles(&profile, &query).await?;
    Ok(Json(IdeasResponse { ideas }))
}

/// POST /api/v1/recommend/products
///
/// Scores a batch of product titles; results keep the submitted order.
pub async fn handle_score_products(
    State(state): State<AppState>,
    AppJson(request): AppJson<ScoreProductsRequest>,
) -> Result<Json<ScoreProductsResponse>, AppError> {
    let profile = resolve_profile(&state, request.source).await?;

    let mut recommendations = state.advisor.score_titles(&profile, &request.ideas).await?;
    state.links.attach(&mut recommendations);

    let items_per_page = recommendations.len();
    Ok(Json(ScoreProductsResponse {
        recommendations,
        pagination: Pagination {
            current_page: 1,
            total_pages: 1,
            items_per_page,
        },
    }))
}

async fn resolve_profile(
    state: &AppState,
    source: ProfileSource,
) -> Result<DogProfileInput, AppError> {
    if let Some(profile) = source.dog_profile {
        return Ok(profile);
    }

    match source.profile_id {
        Some(id) => state
            .profiles
            .get(id)
            .await?
            .map(|stored| DogProfileInput::from(&stored.profile))
            .ok_or_else(|| AppError::NotFound(format!("Dog profile {id} not found"))),
        None => Err(AdvisorError::InvalidInput(
            "dogProfile or profileId is required".to_string(),
        )
        .into()),
    }
}
