use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::db;
use crate::domain::{DailyVisitors, TimeRange};
use crate::state::AppState;

/// Shareable selection: `?range=<token>`
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

/// Body of the visitor-stats remote action
#[derive(Debug, Default, Deserialize)]
pub struct VisitorStatsAction {
    #[serde(rename = "timeRange")]
    pub time_range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }
    }
}

/// The raw `range` token of a query string. A query string that does not
/// deserialize (a repeated `range`, for one) counts as no selection.
pub fn requested_range(
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Option<String> {
    match query {
        Ok(Query(q)) => q.range,
        Err(e) => {
            warn!("Ignoring malformed range query: {}", e);
            None
        }
    }
}

/// Normalize a caller-supplied range token. Absent, malformed and unknown
/// values all become `fallback`; only the latter two are worth a warning.
pub fn resolve_range(raw: Option<&str>, fallback: TimeRange) -> TimeRange {
    match raw {
        Some(s) if !s.trim().is_empty() => match TimeRange::from_token(s) {
            Some(range) => range,
            None => {
                warn!("Unsupported time range {:?}, using {}", s, fallback);
                fallback
            }
        },
        _ => fallback,
    }
}

/// Fetch the visitors series for a raw range token.
///
/// Safe to call from server-side rendering and from remote actions alike:
/// it has no side effects and resolves to an empty series on failure.
pub async fn fetch_series(state: &AppState, raw_range: Option<&str>) -> Vec<DailyVisitors> {
    fetch_series_at(state, raw_range, state.settings.today()).await
}

/// [`fetch_series`] with an explicit "today"
pub async fn fetch_series_at(
    state: &AppState,
    raw_range: Option<&str>,
    today: NaiveDate,
) -> Vec<DailyVisitors> {
    let range = resolve_range(raw_range, state.settings.default_range());
    db::aggregate(&state.pool, range, today, state.settings.zero_fill_gaps).await
}

/// GET /api/visitors?range=
pub async fn get_visitor_stats(
    State(state): State<AppState>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Json<Vec<DailyVisitors>> {
    let raw = requested_range(query);
    Json(fetch_series(&state, raw.as_deref()).await)
}

/// POST /api/actions/visitor-stats
///
/// A body that is not a JSON object with a string `timeRange` counts as
/// no selection at all.
pub async fn visitor_stats_action(State(state): State<AppState>, body: Bytes) -> Json<Vec<DailyVisitors>> {
    let action = parse_action(&body);
    Json(fetch_series(&state, action.time_range.as_deref()).await)
}

fn parse_action(body: &[u8]) -> VisitorStatsAction {
    if body.is_empty() {
        return VisitorStatsAction::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!("Malformed visitor stats action body: {}", e);
        VisitorStatsAction::default()
    })
}

/// GET /api/metrics
pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match db::latest_metrics(&state.pool).await {
        Ok(metrics) => Json(ApiResponse::success(metrics.unwrap_or_default())).into_response(),
        Err(e) => {
            error!("Error fetching metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error("Failed to fetch metrics")),
            )
                .into_response()
        }
    }
}

/// GET /api/documents
pub async fn list_documents(State(state): State<AppState>) -> Response {
    match db::list_document_sections(&state.pool).await {
        Ok(sections) => Json(ApiResponse::success(sections)).into_response(),
        Err(e) => {
            error!("Error listing document sections: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error("Failed to list documents")),
            )
                .into_response()
        }
    }
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
