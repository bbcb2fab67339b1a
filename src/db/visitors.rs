//! Visitor time series: lookback filtering, per-day grouping and the
//! device-type pivot behind the visitors chart.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use super::Pool;
use crate::domain::{DailyVisitors, TimeRange};
use crate::error::{Error, Result};

pub(crate) const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DAY_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[start, today]` window for a range, `start` being
/// `today - lookback_days` at midnight.
pub fn lookback_window(range: TimeRange, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(range.lookback_days()), today)
}

/// Per-day visitor counts for `range`, ascending by date.
///
/// Never fails: a storage error is logged and yields an empty series so the
/// chart can fall back to its "no data" state.
pub async fn aggregate(
    pool: &Pool,
    range: TimeRange,
    today: NaiveDate,
    zero_fill: bool,
) -> Vec<DailyVisitors> {
    let (start, end) = lookback_window(range, today);

    match query_daily_visitors(pool, start, end).await {
        Ok(series) => {
            debug!(
                range = range.as_str(),
                days = series.len(),
                "Aggregated visitor stats"
            );
            if zero_fill {
                fill_gaps(series, start, end)
            } else {
                series
            }
        }
        Err(e) => {
            error!(range = range.as_str(), "Error fetching visitor stats: {}", e);
            Vec::new()
        }
    }
}

/// Grouped, pivoted query over `start <= date <= end` (calendar days).
///
/// Rows that fail validation are skipped with a warning; only storage
/// failures surface as `Err`.
pub async fn query_daily_visitors(
    pool: &Pool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyVisitors>> {
    let end_exclusive = end + Duration::days(1);

    #[cfg(feature = "postgres")]
    let rows: Vec<DailyVisitorsRow> = sqlx::query_as(
        r#"SELECT to_char(date, 'YYYY-MM-DD') AS day,
           COALESCE(SUM(CASE WHEN device_type = 'Desktop' THEN visitor_count ELSE 0 END), 0)::BIGINT AS desktop,
           COALESCE(SUM(CASE WHEN device_type = 'Mobile' THEN visitor_count ELSE 0 END), 0)::BIGINT AS mobile
           FROM visitor_stats
           WHERE date >= $1 AND date < $2
           GROUP BY day
           ORDER BY day ASC"#,
    )
    .bind(start)
    .bind(end_exclusive)
    .fetch_all(pool)
    .await?;

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    let rows: Vec<DailyVisitorsRow> = sqlx::query_as(
        r#"SELECT substr(date, 1, 10) AS day,
           COALESCE(SUM(CASE WHEN device_type = 'Desktop' THEN visitor_count ELSE 0 END), 0) AS desktop,
           COALESCE(SUM(CASE WHEN device_type = 'Mobile' THEN visitor_count ELSE 0 END), 0) AS mobile
           FROM visitor_stats
           WHERE date >= ? AND date < ?
           GROUP BY day
           ORDER BY day ASC"#,
    )
    .bind(start.format(DAY_FORMAT).to_string())
    .bind(end_exclusive.format(DAY_FORMAT).to_string())
    .fetch_all(pool)
    .await?;

    Ok(validate_rows(rows, start, end))
}

/// Decode raw rows into typed days, dropping anything malformed or outside
/// the window, and enforce ascending unique dates.
fn validate_rows(
    rows: Vec<DailyVisitorsRow>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<DailyVisitors> {
    let mut by_day: BTreeMap<NaiveDate, DailyVisitors> = BTreeMap::new();

    for row in rows {
        let parsed = match DailyVisitors::try_from(row) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping visitor stats row: {}", e);
                continue;
            }
        };

        if parsed.date < start || parsed.date > end {
            warn!("Skipping visitor stats row outside window: {}", parsed.date);
            continue;
        }

        // A day can only repeat if the store holds differently formatted
        // timestamps for it; fold them together
        by_day
            .entry(parsed.date)
            .and_modify(|existing| {
                existing.desktop = existing.desktop.saturating_add(parsed.desktop);
                existing.mobile = existing.mobile.saturating_add(parsed.mobile);
            })
            .or_insert(parsed);
    }

    by_day.into_values().collect()
}

/// Zero-fill every calendar day of `[start, end]` once the window holds any
/// data. An empty series stays empty.
pub fn fill_gaps(series: Vec<DailyVisitors>, start: NaiveDate, end: NaiveDate) -> Vec<DailyVisitors> {
    if series.is_empty() || start > end {
        return series;
    }

    let mut by_day: BTreeMap<NaiveDate, DailyVisitors> =
        series.into_iter().map(|d| (d.date, d)).collect();

    for day in start.iter_days().take_while(|d| *d <= end) {
        by_day.entry(day).or_insert_with(|| DailyVisitors::zero(day));
    }

    by_day.into_values().collect()
}

#[derive(Debug, sqlx::FromRow)]
struct DailyVisitorsRow {
    day: Option<String>,
    desktop: i64,
    mobile: i64,
}

impl TryFrom<DailyVisitorsRow> for DailyVisitors {
    type Error = Error;

    fn try_from(row: DailyVisitorsRow) -> Result<Self> {
        let raw = row
            .day
            .ok_or_else(|| Error::MalformedRow("missing date".to_string()))?;
        let date = NaiveDate::parse_from_str(&raw, DAY_FORMAT)
            .map_err(|_| Error::MalformedRow(format!("unparseable date {:?}", raw)))?;

        if row.desktop < 0 || row.mobile < 0 {
            return Err(Error::MalformedRow(format!(
                "negative count on {} (desktop {}, mobile {})",
                raw, row.desktop, row.mobile
            )));
        }

        Ok(Self {
            date,
            desktop: row.desktop,
            mobile: row.mobile,
        })
    }
}
