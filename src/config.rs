use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::domain::TimeRange;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub database_url: Option<String>,
    pub database_path: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// IANA zone that decides where "today" starts
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Range token used when the request carries none (or an unknown one)
    #[serde(default = "default_range")]
    pub default_range: String,

    #[serde(default = "default_zero_fill_gaps")]
    pub zero_fill_gaps: bool,

    #[serde(default = "default_initial_render_timeout")]
    pub initial_render_timeout_ms: u64,

    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_range() -> String {
    TimeRange::DEFAULT.as_str().to_string()
}

fn default_zero_fill_gaps() -> bool {
    true
}

fn default_initial_render_timeout() -> u64 {
    2000
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            database_path: None,
            max_connections: default_max_connections(),
            time_zone: default_time_zone(),
            default_range: default_range(),
            zero_fill_gaps: default_zero_fill_gaps(),
            initial_render_timeout_ms: default_initial_render_timeout(),
            static_dir: default_static_dir(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PULSEBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings.normalized())
    }

    /// Replace an unknown time zone with UTC, warning once at load time
    /// rather than on every `today()`.
    fn normalized(mut self) -> Self {
        if self.time_zone.parse::<Tz>().is_err() {
            warn!("Unknown time zone {:?}, using UTC", self.time_zone);
            self.time_zone = "UTC".to_string();
        }
        self
    }

    /// Resolve the database URL, preferring an explicit URL over a file path
    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .or_else(|| {
                self.database_path
                    .as_ref()
                    .map(|p| format!("sqlite:{}?mode=rwc", p))
            })
            .unwrap_or_else(|| {
                #[cfg(feature = "postgres")]
                {
                    "postgres://localhost/pulseboard".to_string()
                }
                #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
                {
                    "sqlite:pulseboard.db?mode=rwc".to_string()
                }
            })
    }

    pub fn tz(&self) -> Tz {
        self.time_zone.parse().unwrap_or(Tz::UTC)
    }

    pub fn default_range(&self) -> TimeRange {
        TimeRange::parse_or_default(Some(&self.default_range))
    }

    /// Current calendar day in the dashboard time zone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz()).date_naive()
    }

    pub fn initial_render_timeout(&self) -> Duration {
        Duration::from_millis(self.initial_render_timeout_ms)
    }
}
