use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))
        // Streaming chat exchange
        .route("/api/chat", post(handlers::chat))
        // Standalone speech synthesis
        .route("/api/tts", post(handlers::synthesize))
        // Request logging + permissive CORS for the embedded front end
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
