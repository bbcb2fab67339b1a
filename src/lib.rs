pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod domain;
pub mod error;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;

/// All routes, without transport middleware
pub fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.settings.static_dir);

    Router::new()
        // Dashboard routes
        .route("/", get(dashboard::dashboard_index))
        .route("/partials/visitor-chart", get(dashboard::visitor_chart_partial))
        // API routes
        .route("/api/visitors", get(api::get_visitor_stats))
        .route("/api/actions/visitor-stats", post(api::visitor_stats_action))
        .route("/api/metrics", get(api::get_metrics))
        .route("/api/documents", get(api::list_documents))
        .route("/healthz", get(api::healthz))
        // Static files
        .nest_service("/static", static_dir)
        .with_state(state)
}
