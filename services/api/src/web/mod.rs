pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, post},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full application router: the REST API plus the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let api_router = Router::new()
        .route("/prompts/visualization", post(rest::visualization_prompt_handler))
        .route("/prompts/offline", post(rest::offline_prompt_handler))
        .route("/prompts/baseline", post(rest::baseline_prompt_handler))
        .route("/prompts/contextual", post(rest::contextual_prompt_handler))
        .route("/progression/check", post(rest::check_progression_handler))
        .route("/milestones", post(rest::milestones_handler))
        .route("/status", get(rest::status_handler))
        .route("/cache", delete(rest::clear_cache_handler))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
