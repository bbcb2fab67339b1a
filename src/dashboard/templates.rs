use askama::Template;

use crate::chart::{self, AreaChart, LegendItem};
use crate::domain::{DashboardMetrics, DocumentSectionListing, SectionStatus, TimeRange};

#[derive(Template)]
#[template(path = "dashboard/index.html")]
pub struct DashboardIndexTemplate {
    pub cards: Vec<MetricCard>,
    /// Pre-rendered chart fragment (chart, empty state or skeleton)
    pub chart_html: String,
    pub sections: Vec<SectionRow>,
    pub selected: &'static str,
    pub breakpoint_px: u32,
}

/// Chart card body, also served alone as the `/partials/visitor-chart` fragment
#[derive(Template)]
#[template(path = "components/visitor_chart.html")]
pub struct VisitorChartTemplate {
    pub range: &'static str,
    pub range_label: &'static str,
    pub ranges: Vec<RangeOption>,
    pub chart: Option<AreaChart>,
    pub legend: Vec<LegendItem>,
    pub width: u32,
    pub height: u32,
}

impl VisitorChartTemplate {
    pub fn new(range: TimeRange, chart: Option<AreaChart>) -> Self {
        Self {
            range: range.as_str(),
            range_label: range.label(),
            ranges: RangeOption::all(range),
            chart,
            legend: chart::legend(),
            width: chart::WIDTH,
            height: chart::HEIGHT,
        }
    }
}

/// Same box as the chart so the first paint never jumps
#[derive(Template)]
#[template(path = "components/chart_skeleton.html")]
pub struct ChartSkeletonTemplate {
    pub range: &'static str,
    pub range_label: &'static str,
    pub ranges: Vec<RangeOption>,
    pub width: u32,
    pub height: u32,
}

impl ChartSkeletonTemplate {
    pub fn new(range: TimeRange) -> Self {
        Self {
            range: range.as_str(),
            range_label: range.label(),
            ranges: RangeOption::all(range),
            width: chart::WIDTH,
            height: chart::HEIGHT,
        }
    }
}

pub struct RangeOption {
    pub token: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl RangeOption {
    pub fn all(selected: TimeRange) -> Vec<Self> {
        TimeRange::ALL
            .iter()
            .map(|r| Self {
                token: r.as_str(),
                label: r.label(),
                selected: *r == selected,
            })
            .collect()
    }
}

pub struct MetricCard {
    pub title: &'static str,
    pub value: String,
    pub footer: &'static str,
    pub trending_up: bool,
}

impl MetricCard {
    /// The four KPI cards; missing values render as zero
    pub fn from_metrics(metrics: &DashboardMetrics) -> Vec<Self> {
        vec![
            Self {
                title: "Total Revenue",
                value: currency(metrics.total_revenue.unwrap_or(0.0)),
                footer: "Total revenue calculation",
                trending_up: true,
            },
            Self {
                title: "New Customers",
                value: intcomma(metrics.new_customers.unwrap_or(0)),
                footer: "New customer count",
                trending_up: false,
            },
            Self {
                title: "Active Accounts",
                value: intcomma(metrics.active_accounts.unwrap_or(0)),
                footer: "Active user accounts",
                trending_up: true,
            },
            Self {
                title: "Growth Rate",
                value: percentage(metrics.growth_rate.unwrap_or(0.0)),
                footer: "Calculated growth rate",
                trending_up: metrics.growth_rate.unwrap_or(0.0) >= 0.0,
            },
        ]
    }
}

/// A document section with display-ready columns
pub struct SectionRow {
    pub header: String,
    pub section_type: String,
    pub status: String,
    pub done: bool,
    pub target: String,
    pub limit: String,
    pub reviewer: String,
    pub has_reviewer: bool,
}

impl From<DocumentSectionListing> for SectionRow {
    fn from(listing: DocumentSectionListing) -> Self {
        Self {
            done: listing.status == SectionStatus::Done.as_str(),
            has_reviewer: listing.reviewer.is_some(),
            reviewer: listing
                .reviewer
                .unwrap_or_else(|| "Assign reviewer".to_string()),
            header: listing.header,
            section_type: listing.section_type,
            status: listing.status,
            target: intcomma(listing.target),
            limit: intcomma(listing.limit),
        }
    }
}

/// 1234567 -> "1,234,567"
pub fn intcomma(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        result.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// 1250.5 -> "$1,250.50"
pub fn currency(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!(
        "{}${}.{:02}",
        sign,
        intcomma((cents / 100) as i64),
        cents % 100
    )
}

/// Growth rate is stored in percent: 4.5 -> "4.5%"
pub fn percentage(value: f64) -> String {
    let formatted = format!("{:.1}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{}%", trimmed)
}
