//! Dashboard and report endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Json,
};
use serde_json::json;

use crate::reports::DASHBOARD_HTML;
use crate::state::AppState;

/// The dashboard page.
///
/// GET /reports
pub async fn dashboard() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

/// The full performance report as JSON.
///
/// GET /reports/data
pub async fn report_data(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.collector.report())
}

/// Recent log entries as JSON.
///
/// GET /reports/logs
pub async fn logs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.collector.logs())
}

/// Clear the log buffer.
///
/// GET /reports/logs/clear
pub async fn clear_logs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.collector.clear_logs();
    Json(json!({"status": "cleared"}))
}
