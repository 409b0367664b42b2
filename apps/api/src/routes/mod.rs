pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::orchestrator::handlers;
use crate::state::AppState;

/// Uploaded PDFs can be scans; allow well beyond axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route("/api/v1/session/analyze", post(handlers::handle_analyze))
        .route(
            "/api/v1/session/reports/additional-questions",
            post(handlers::handle_additional_questions),
        )
        .route(
            "/api/v1/session/reports/strategy",
            post(handlers::handle_strategy_report),
        )
        .route(
            "/api/v1/session/reports/model-answers",
            post(handlers::handle_model_answers),
        )
        .route(
            "/api/v1/session/simulation/start",
            post(handlers::handle_simulation_start),
        )
        .route(
            "/api/v1/session/simulation/turns",
            post(handlers::handle_simulation_turn),
        )
        .route(
            "/api/v1/session/simulation/finalize",
            post(handlers::handle_simulation_finalize),
        )
        .route("/api/v1/session/restart", post(handlers::handle_restart))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
