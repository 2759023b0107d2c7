use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

pub mod defaults;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::guide::expander::MINUTES_PER_DAY;
use crate::guide::{ExpansionPolicy, MergeConfig};
use crate::utils::datetime::DateTimeParser;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Where the three guides come from and where the result goes
///
/// Each source is either an `http(s)://` URL or a local path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub primary: Option<String>,
    #[serde(default = "default_template")]
    pub template: String,
    pub supplementary: Option<String>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Tile each day from midnight with fixed blocks
    Tile,
    /// One programme per day at the template's time
    #[serde(alias = "single-instance")]
    Single,
    /// Template start/stop shifted by whole days
    Verbatim,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_policy")]
    pub policy: PolicyKind,
    #[serde(default = "default_block_minutes")]
    pub block_minutes: u32,
    #[serde(default = "default_instance_duration_minutes")]
    pub instance_duration_minutes: u32,
    /// IANA timezone whose current date is used when no reference day is set
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Explicit first day (`YYYY-MM-DD`)
    pub reference_day: Option<String>,
    pub strip_payload_suffix: Option<String>,
    /// Offset appended when a template start has none
    #[serde(default = "default_offset")]
    pub default_offset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE_PATH.to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_days() -> u32 {
    DEFAULT_DAYS
}

fn default_policy() -> PolicyKind {
    PolicyKind::Tile
}

fn default_block_minutes() -> u32 {
    DEFAULT_BLOCK_MINUTES
}

fn default_instance_duration_minutes() -> u32 {
    DEFAULT_INSTANCE_DURATION_MINUTES
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_offset() -> String {
    DEFAULT_OFFSET.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary: None,
            template: default_template(),
            supplementary: None,
            output: default_output(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            days: default_days(),
            policy: default_policy(),
            block_minutes: default_block_minutes(),
            instance_duration_minutes: default_instance_duration_minutes(),
            timezone: default_timezone(),
            reference_day: None,
            strip_payload_suffix: None,
            default_offset: default_offset(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScheduleConfig {
    pub fn expansion_policy(&self) -> ExpansionPolicy {
        match self.policy {
            PolicyKind::Tile => ExpansionPolicy::Tile {
                block_minutes: self.block_minutes,
            },
            PolicyKind::Single => ExpansionPolicy::SingleInstance {
                duration_minutes: self.instance_duration_minutes,
            },
            PolicyKind::Verbatim => ExpansionPolicy::Verbatim,
        }
    }

    /// The configured reference day, or today in the configured timezone
    pub fn resolve_reference_day(&self, now: DateTime<Utc>) -> AppResult<NaiveDate> {
        match &self.reference_day {
            Some(day) => DateTimeParser::parse_reference_day(day)
                .map_err(|e| AppError::configuration(e.to_string())),
            None => DateTimeParser::local_date(now, &self.timezone)
                .map_err(|e| AppError::configuration(e.to_string())),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.days == 0 || self.days > MAX_DAYS {
            return Err(AppError::configuration(format!(
                "schedule.days must be between 1 and {MAX_DAYS}, got {}",
                self.days
            )));
        }
        if self.block_minutes == 0 || self.block_minutes > MINUTES_PER_DAY {
            return Err(AppError::configuration(format!(
                "schedule.block_minutes must be between 1 and {MINUTES_PER_DAY}, got {}",
                self.block_minutes
            )));
        }
        if self.instance_duration_minutes == 0 || self.instance_duration_minutes > MINUTES_PER_DAY
        {
            return Err(AppError::configuration(format!(
                "schedule.instance_duration_minutes must be between 1 and {MINUTES_PER_DAY}, got {}",
                self.instance_duration_minutes
            )));
        }
        if !DateTimeParser::is_valid_timezone(&self.timezone) {
            return Err(AppError::configuration(format!(
                "schedule.timezone '{}' is not a known IANA timezone",
                self.timezone
            )));
        }
        if let Some(day) = &self.reference_day {
            DateTimeParser::parse_reference_day(day)
                .map_err(|e| AppError::configuration(e.to_string()))?;
        }
        Ok(())
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No configuration file at {}, using defaults", config_file);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        match self.sources.primary.as_deref() {
            Some(primary) if !primary.trim().is_empty() => {}
            _ => {
                return Err(AppError::configuration(
                    "sources.primary must be set to a URL or file path",
                ))
            }
        }
        if self.sources.template.trim().is_empty() {
            return Err(AppError::configuration("sources.template must not be empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::configuration("fetch.timeout_secs must be positive"));
        }
        self.schedule.validate()
    }

    /// Build the merger settings for a run happening at `now`
    pub fn merge_config(&self, now: DateTime<Utc>) -> AppResult<MergeConfig> {
        self.schedule.validate()?;
        Ok(MergeConfig {
            reference_day: self.schedule.resolve_reference_day(now)?,
            day_count: self.schedule.days,
            policy: self.schedule.expansion_policy(),
            strip_payload_suffix: self
                .schedule
                .strip_payload_suffix
                .clone()
                .filter(|s| !s.is_empty()),
            default_offset: self.schedule.default_offset.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.schedule.days, DEFAULT_DAYS);
        assert_eq!(config.schedule.policy, PolicyKind::Tile);
        assert_eq!(config.schedule.default_offset, " +0000");
        assert_eq!(config.sources.template, DEFAULT_TEMPLATE_PATH);
        assert!(config.sources.primary.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [sources]
            primary = "http://example.com/guide.xml"
            template = "radio.xml"
            supplementary = "big.xml.gz"
            output = "out.xml"

            [schedule]
            days = 2
            policy = "single-instance"
            instance_duration_minutes = 90
            timezone = "America/Mexico_City"
            strip_payload_suffix = "(n)"

            [fetch]
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(
            config.schedule.expansion_policy(),
            ExpansionPolicy::SingleInstance { duration_minutes: 90 }
        );
        assert_eq!(config.sources.output, PathBuf::from("out.xml"));
        assert_eq!(config.fetch.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.sources.primary = Some("primary.xml".to_string());
        assert!(config.validate().is_ok());

        config.schedule.block_minutes = 0;
        assert!(config.validate().is_err());
        config.schedule.block_minutes = 30;

        config.schedule.days = 0;
        assert!(config.validate().is_err());
        config.schedule.days = 1;

        config.schedule.timezone = "Nowhere/Special".to_string();
        assert!(config.validate().is_err());
        config.schedule.timezone = "UTC".to_string();

        config.schedule.reference_day = Some("01/02/2024".to_string());
        assert!(matches!(
            config.validate(),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_merge_config_uses_timezone_today() {
        let mut config = Config::default();
        config.schedule.timezone = "America/Mexico_City".to_string();
        config.schedule.strip_payload_suffix = Some(String::new());

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let merge = config.merge_config(now).unwrap();
        assert_eq!(merge.reference_day, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(merge.strip_payload_suffix, None);
        assert_eq!(merge.policy, ExpansionPolicy::Tile { block_minutes: 30 });
    }

    #[test]
    fn test_explicit_reference_day_wins() {
        let mut config = Config::default();
        config.schedule.reference_day = Some("2024-07-04".to_string());
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            config.merge_config(now).unwrap().reference_day,
            NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load_from_file("/nonexistent/epg-merger.toml").unwrap();
        assert_eq!(config.schedule.block_minutes, DEFAULT_BLOCK_MINUTES);
    }
}
