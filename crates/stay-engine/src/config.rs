//! Run configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.

use std::path::Path;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::model::{ResolutionWindow, Source};

/// One configured booking feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub source: Source,
    /// `http(s)://` URL or local file path.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    #[serde(default = "default_buffer_days")]
    pub before_days: u32,
    #[serde(default = "default_buffer_days")]
    pub after_days: u32,
    #[serde(default = "default_window_past_days")]
    pub window_past_days: u32,
    #[serde(default = "default_window_future_days")]
    pub window_future_days: u32,
    /// IANA zone of the property; decides which night a timed boundary falls on.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_parallel_fetches")]
    pub max_parallel_fetches: usize,
    #[serde(default)]
    pub sources: Vec<FeedConfig>,
}

/// Upper bound for `before_days` and `after_days`.
pub const MAX_BUFFER_DAYS: u32 = 365;
/// Upper bound for each side of the resolution window.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

fn default_buffer_days() -> u32 {
    1
}

fn default_window_past_days() -> u32 {
    365
}

fn default_window_future_days() -> u32 {
    730
}

fn default_timezone() -> String {
    "Europe/Lisbon".to_string()
}

fn default_calendar_name() -> String {
    "Rental Calendar".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_parallel_fetches() -> usize {
    5
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            before_days: default_buffer_days(),
            after_days: default_buffer_days(),
            window_past_days: default_window_past_days(),
            window_future_days: default_window_future_days(),
            timezone: default_timezone(),
            calendar_name: default_calendar_name(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_parallel_fetches: default_max_parallel_fetches(),
            sources: Vec::new(),
        }
    }
}

impl SyncConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.max_parallel_fetches == 0 {
            return Err(SyncError::Config(
                "max_parallel_fetches must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(SyncError::Config(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        for (name, days, max) in [
            ("before_days", self.before_days, MAX_BUFFER_DAYS),
            ("after_days", self.after_days, MAX_BUFFER_DAYS),
            ("window_past_days", self.window_past_days, MAX_WINDOW_DAYS),
            ("window_future_days", self.window_future_days, MAX_WINDOW_DAYS),
        ] {
            if days > max {
                return Err(SyncError::Config(format!("{name} must be at most {max}, got {days}")));
            }
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| SyncError::Config(format!("unknown timezone '{}'", self.timezone)))
    }

    /// Current date at the property.
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.tz()?).date_naive())
    }

    pub fn window(&self, today: NaiveDate) -> Result<ResolutionWindow> {
        ResolutionWindow::around(today, self.window_past_days, self.window_future_days)
    }
}
