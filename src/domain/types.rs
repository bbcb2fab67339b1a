use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lookback window selectable on the visitors chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "7d")]
    Last7Days,
}

impl TimeRange {
    /// Declaration order is the order of the toggle control
    pub const ALL: [TimeRange; 3] = [Self::Last90Days, Self::Last30Days, Self::Last7Days];

    /// Longest lookback, used when nothing (or garbage) is selected
    pub const DEFAULT: TimeRange = Self::Last90Days;

    /// Forced on narrow viewports
    pub const SHORTEST: TimeRange = Self::Last7Days;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last90Days => "90d",
            Self::Last30Days => "30d",
            Self::Last7Days => "7d",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Last90Days => "Last 3 months",
            Self::Last30Days => "Last 30 days",
            Self::Last7Days => "Last 7 days",
        }
    }

    pub fn lookback_days(&self) -> i64 {
        match self {
            Self::Last90Days => 90,
            Self::Last30Days => 30,
            Self::Last7Days => 7,
        }
    }

    /// Strict token lookup. Surrounding whitespace is ignored, case is not.
    pub fn from_token(s: &str) -> Option<Self> {
        match s.trim() {
            "90d" => Some(Self::Last90Days),
            "30d" => Some(Self::Last30Days),
            "7d" => Some(Self::Last7Days),
            _ => None,
        }
    }

    /// Normalize a caller-supplied token, substituting `fallback` for
    /// absent, malformed or unknown values.
    pub fn parse_or(raw: Option<&str>, fallback: TimeRange) -> Self {
        raw.and_then(Self::from_token).unwrap_or(fallback)
    }

    pub fn parse_or_default(raw: Option<&str>) -> Self {
        Self::parse_or(raw, Self::DEFAULT)
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Mobile,
    Desktop,
    Other,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Desktop => "Desktop",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SectionStatus {
    #[default]
    InProcess,
    Done,
    PendingReview,
    Blocked,
}

impl SectionStatus {
    pub const ALL: [SectionStatus; 4] = [
        Self::InProcess,
        Self::Done,
        Self::PendingReview,
        Self::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProcess => "In Process",
            Self::Done => "Done",
            Self::PendingReview => "Pending Review",
            Self::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SectionType {
    CoverPage,
    TableOfContents,
    Narrative,
    TechnicalContent,
    ExecutiveSummary,
    Design,
    Capabilities,
    Integration,
    Innovation,
    SolutionsOverview,
    AdvancedAlgorithms,
    #[default]
    Other,
}

impl SectionType {
    pub const ALL: [SectionType; 12] = [
        Self::CoverPage,
        Self::TableOfContents,
        Self::Narrative,
        Self::TechnicalContent,
        Self::ExecutiveSummary,
        Self::Design,
        Self::Capabilities,
        Self::Integration,
        Self::Innovation,
        Self::SolutionsOverview,
        Self::AdvancedAlgorithms,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoverPage => "Cover page",
            Self::TableOfContents => "Table of contents",
            Self::Narrative => "Narrative",
            Self::TechnicalContent => "Technical content",
            Self::ExecutiveSummary => "Executive summary",
            Self::Design => "Design",
            Self::Capabilities => "Capabilities",
            Self::Integration => "Integration with existing systems",
            Self::Innovation => "Innovation and Advantages",
            Self::SolutionsOverview => "Overview of EMR's Innovative Solutions",
            Self::AdvancedAlgorithms => "Advanced Algorithms and Machine Learning",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub Uuid);

impl SectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_tokens() {
        assert_eq!(TimeRange::from_token("90d"), Some(TimeRange::Last90Days));
        assert_eq!(TimeRange::from_token("30d"), Some(TimeRange::Last30Days));
        assert_eq!(TimeRange::from_token("7d"), Some(TimeRange::Last7Days));
        assert_eq!(TimeRange::from_token(" 7d "), Some(TimeRange::Last7Days));
        assert_eq!(TimeRange::from_token("7D"), None);
        assert_eq!(TimeRange::from_token("14d"), None);
        assert_eq!(TimeRange::from_token(""), None);

        for range in TimeRange::ALL {
            assert_eq!(TimeRange::from_token(range.as_str()), Some(range));
        }
    }

    #[test]
    fn test_time_range_parse_or_default() {
        assert_eq!(TimeRange::parse_or_default(None), TimeRange::Last90Days);
        assert_eq!(
            TimeRange::parse_or_default(Some("invalid-token")),
            TimeRange::Last90Days
        );
        assert_eq!(
            TimeRange::parse_or_default(Some("30d")),
            TimeRange::Last30Days
        );
        assert_eq!(
            TimeRange::parse_or(Some("bogus"), TimeRange::Last7Days),
            TimeRange::Last7Days
        );
    }

    #[test]
    fn test_time_range_lookback_and_labels() {
        assert_eq!(TimeRange::Last90Days.lookback_days(), 90);
        assert_eq!(TimeRange::Last30Days.lookback_days(), 30);
        assert_eq!(TimeRange::Last7Days.lookback_days(), 7);
        assert_eq!(TimeRange::Last90Days.label(), "Last 3 months");
        assert_eq!(TimeRange::default(), TimeRange::DEFAULT);
        assert!(TimeRange::ALL
            .iter()
            .all(|r| r.lookback_days() >= TimeRange::SHORTEST.lookback_days()));
        assert!(TimeRange::ALL
            .iter()
            .all(|r| r.lookback_days() <= TimeRange::DEFAULT.lookback_days()));
    }

    #[test]
    fn test_time_range_serde() {
        let json = serde_json::to_string(&TimeRange::Last30Days).unwrap();
        assert_eq!(json, "\"30d\"");
        let parsed: TimeRange = serde_json::from_str("\"7d\"").unwrap();
        assert_eq!(parsed, TimeRange::Last7Days);
        assert!(serde_json::from_str::<TimeRange>("\"1y\"").is_err());
    }

    #[test]
    fn test_device_type_names() {
        assert_eq!(DeviceType::Desktop.to_string(), "Desktop");
        assert_eq!(DeviceType::Mobile.as_str(), "Mobile");
        assert_eq!(DeviceType::Other.as_str(), "Other");
    }

    #[test]
    fn test_section_enums() {
        assert_eq!(SectionStatus::default(), SectionStatus::InProcess);
        assert_eq!(SectionStatus::PendingReview.to_string(), "Pending Review");
        assert_eq!(SectionType::default(), SectionType::Other);
        assert_eq!(
            SectionType::Integration.as_str(),
            "Integration with existing systems"
        );
    }

    #[test]
    fn test_ids_unique() {
        assert_ne!(UserId::new(), UserId::new());
        assert_ne!(DocumentId::new(), DocumentId::new());
        assert_ne!(SectionId::new(), SectionId::new());
    }
}
