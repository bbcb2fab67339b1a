use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{DeviceType, DocumentId, SectionId, SectionStatus, SectionType, UserId};

/// One stored row of the `visitor_stats` table.
///
/// Ingestion normally writes one row per day at midnight; `date` keeps the
/// time component so several partial counts for the same day can coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorStat {
    pub date: NaiveDateTime,
    pub device_type: DeviceType,
    pub visitor_count: i64,
}

impl VisitorStat {
    pub fn daily(day: NaiveDate, device_type: DeviceType, visitor_count: i64) -> Self {
        Self {
            date: day.and_time(chrono::NaiveTime::MIN),
            device_type,
            visitor_count,
        }
    }
}

/// One day of the visitors chart, device types pivoted into columns.
///
/// Serializes as `{"date": "YYYY-MM-DD", "desktop": n, "mobile": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVisitors {
    pub date: NaiveDate,
    pub desktop: i64,
    pub mobile: i64,
}

impl DailyVisitors {
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            desktop: 0,
            mobile: 0,
        }
    }

    pub fn count(&self, device_type: DeviceType) -> i64 {
        match device_type {
            DeviceType::Desktop => self.desktop,
            DeviceType::Mobile => self.mobile,
            DeviceType::Other => 0,
        }
    }

    pub fn total(&self) -> i64 {
        self.desktop.saturating_add(self.mobile)
    }
}

/// Latest KPI snapshot shown in the cards above the chart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub recorded_at: Option<DateTime<Utc>>,
    pub total_revenue: Option<f64>,
    pub new_customers: Option<i64>,
    pub active_accounts: Option<i64>,
    pub growth_rate: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateMetrics {
    pub recorded_at: Option<DateTime<Utc>>,
    pub total_revenue: Option<f64>,
    pub new_customers: Option<i64>,
    pub active_accounts: Option<i64>,
    pub growth_rate: Option<f64>,
}

/// A document section as listed in the dashboard table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSectionListing {
    pub id: SectionId,
    pub header: String,
    #[serde(rename = "type")]
    pub section_type: String,
    pub status: String,
    pub target: i64,
    pub limit: i64,
    pub reviewer: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub title: String,
    pub owner_id: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct CreateSection {
    pub document_id: DocumentId,
    pub header: String,
    pub section_type: Option<SectionType>,
    pub status: SectionStatus,
    pub target: Option<i64>,
    pub limit: Option<i64>,
    pub reviewer_id: Option<UserId>,
    pub order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_daily_visitors_wire_shape() {
        let row = DailyVisitors {
            date: day("2024-06-01"),
            desktop: 30,
            mobile: 5,
        };
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"date": "2024-06-01", "desktop": 30, "mobile": 5})
        );
    }

    #[test]
    fn test_visitor_stat_daily_is_midnight() {
        let stat = VisitorStat::daily(day("2024-06-01"), DeviceType::Mobile, 7);
        assert_eq!(stat.date.date(), day("2024-06-01"));
        assert_eq!(stat.date.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_daily_visitors_count() {
        let row = DailyVisitors {
            date: day("2024-06-01"),
            desktop: 12,
            mobile: 3,
        };
        assert_eq!(row.count(DeviceType::Desktop), 12);
        assert_eq!(row.count(DeviceType::Mobile), 3);
        assert_eq!(row.count(DeviceType::Other), 0);
        assert_eq!(row.total(), 15);
        assert_eq!(DailyVisitors::zero(row.date).total(), 0);
    }

    #[test]
    fn test_dashboard_metrics_default() {
        let metrics = DashboardMetrics::default();
        assert!(metrics.recorded_at.is_none());
        assert!(metrics.total_revenue.is_none());
        assert!(metrics.new_customers.is_none());
    }

    #[test]
    fn test_section_listing_serializes_type_key() {
        let listing = DocumentSectionListing {
            id: SectionId::new(),
            header: "Cover page".to_string(),
            section_type: "Cover page".to_string(),
            status: "Done".to_string(),
            target: 18,
            limit: 5,
            reviewer: None,
            order: 0,
        };
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["type"], "Cover page");
        assert!(json["reviewer"].is_null());
    }
}
