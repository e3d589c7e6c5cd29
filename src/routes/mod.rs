//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers); adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/curriculum", get(http::http_get_curriculum))
        .route("/api/v1/curriculum/:id", get(http::http_get_chapter))
        .route("/api/v1/curriculum/:id/problem", get(http::http_get_chapter_problem))
        .route("/api/v1/operations", get(http::http_get_operations))
        .route("/api/v1/problem", get(http::http_get_problem))
        .route("/api/v1/problem/random", get(http::http_get_random_problem))
        .route("/api/v1/answer", post(http::http_post_answer))
        .route("/api/v1/wrong", get(http::http_get_wrong).post(http::http_post_wrong))
        .route("/api/v1/wrong/:id", delete(http::http_delete_wrong))
        .route("/api/v1/wrong/:id/similar", get(http::http_get_similar))
        .route(
            "/api/v1/progress",
            get(http::http_get_progress)
                .post(http::http_post_progress)
                .delete(http::http_delete_progress),
        )
        .route("/api/v1/progress/streak", get(http::http_get_streak))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
