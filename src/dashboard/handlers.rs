use askama::Template;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::api::{self, RangeQuery};
use crate::chart::{AreaChart, ChartState, ChartView, Viewport};
use crate::db;
use crate::domain::TimeRange;
use crate::error::Result;
use crate::state::AppState;

use super::templates::*;

/// GET /
pub async fn dashboard_index(
    State(state): State<AppState>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Response {
    let raw = api::requested_range(query);
    let range = api::resolve_range(raw.as_deref(), state.settings.default_range());

    let metrics = match db::latest_metrics(&state.pool).await {
        Ok(m) => m.unwrap_or_default(),
        Err(e) => {
            error!("Error fetching metrics: {}", e);
            Default::default()
        }
    };

    let sections = match db::list_document_sections(&state.pool).await {
        Ok(s) => s,
        Err(e) => {
            error!("Error listing document sections: {}", e);
            Vec::new()
        }
    };

    // A slow store must not hold the whole page; the skeleton asks for the
    // fragment again from the browser
    let limit = state.settings.initial_render_timeout();
    let chart = match tokio::time::timeout(limit, api::fetch_series(&state, Some(range.as_str())))
        .await
    {
        Ok(series) => ChartState::with_series(range, series),
        Err(_) => {
            warn!(
                range = range.as_str(),
                "Visitor series not ready after {:?}, sending skeleton", limit
            );
            ChartState::new(range)
        }
    };

    let chart_html = match render_chart(&chart) {
        Ok(html) => html,
        Err(e) => {
            error!("Chart render error: {}", e);
            return e.into_response();
        }
    };

    let template = DashboardIndexTemplate {
        cards: MetricCard::from_metrics(&metrics),
        chart_html,
        sections: sections.into_iter().map(SectionRow::from).collect(),
        selected: range.as_str(),
        breakpoint_px: Viewport::MOBILE_BREAKPOINT_PX,
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// GET /partials/visitor-chart?range=
///
/// Chart card body for a range; the page script swaps it in after a
/// selection change.
pub async fn visitor_chart_partial(
    State(state): State<AppState>,
    query: std::result::Result<Query<RangeQuery>, QueryRejection>,
) -> Response {
    let raw = api::requested_range(query);
    let range = api::resolve_range(raw.as_deref(), state.settings.default_range());
    let series = api::fetch_series(&state, Some(range.as_str())).await;
    debug!(range = range.as_str(), days = series.len(), "Rendering chart partial");

    match render_chart(&ChartState::with_series(range, series)) {
        Ok(html) => ([(header::CACHE_CONTROL, "no-store")], Html(html)).into_response(),
        Err(e) => {
            error!("Chart render error: {}", e);
            e.into_response()
        }
    }
}

/// Chart card body for whatever the state currently shows
pub fn render_chart(chart: &ChartState) -> Result<String> {
    let range: TimeRange = chart.selected();
    let html = match chart.view() {
        ChartView::Skeleton => ChartSkeletonTemplate::new(range).render()?,
        ChartView::Empty => VisitorChartTemplate::new(range, None).render()?,
        ChartView::Chart(series) => {
            VisitorChartTemplate::new(range, AreaChart::build(series)).render()?
        }
    };
    Ok(html)
}
