pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::advisor::handlers as advisor;
use crate::profiles::handlers as profiles;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation API
        .route("/api/v1/categories", get(advisor::handle_list_categories))
        .route("/api/v1/recommend", post(advisor::handle_recommend))
        .route(
            "/api/v1/recommend/ideas",
            post(advisor::handle_suggest_ideas),
        )
        .route(
            "/api/v1/recommend/products",
            post(advisor::handle_score_products),
        )
        // Dog profiles
        .route(
            "/api/v1/profiles",
            get(profiles::handle_list_profiles).post(profiles::handle_create_profile),
        )
        .route(
            "/api/v1/profiles/:id",
            get(profiles::handle_get_profile)
                .put(profiles::handle_update_profile)
                .delete(profiles::handle_delete_profile),
        )
        .with_state(state)
}
