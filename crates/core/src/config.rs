//! Engine configuration
//!
//! Optional TOML file overriding the built-in contest defaults and the
//! data directory. A missing file means built-in defaults; a present but
//! malformed file is an error so typos do not silently fall back.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::models::Contest;
use crate::periods::PeriodWindow;

const DB_FILE_NAME: &str = "patrol.db";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid time '{value}' for {field}; expected HH:MM")]
    InvalidTime { field: &'static str, value: String },
}

/// Defaults applied to newly created contests.
#[derive(Debug, Clone)]
pub struct ContestDefaults {
    pub required_hours: u32,
    pub max_daily_hours: f64,
    pub afternoon: PeriodWindow,
    pub night: PeriodWindow,
    pub afternoon_winners: u32,
    pub night_vip_winners: u32,
}

impl Default for ContestDefaults {
    fn default() -> Self {
        Self {
            required_hours: 18,
            max_daily_hours: 4.5,
            afternoon: PeriodWindow::from_hm(13, 0, 18, 0),
            night: PeriodWindow::from_hm(19, 0, 0, 0),
            afternoon_winners: 3,
            night_vip_winners: 2,
        }
    }
}

impl ContestDefaults {
    /// Overwrite a fresh contest's tunables with these defaults.
    pub fn apply(&self, contest: &mut Contest) {
        contest.required_hours = self.required_hours;
        contest.max_daily_hours = self.max_daily_hours;
        contest.afternoon = self.afternoon;
        contest.night = self.night;
        contest.afternoon_winners = self.afternoon_winners;
        contest.night_vip_winners = self.night_vip_winners;
    }
}

/// Engine configuration resolved from a TOML file.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Where the database lives; platform data dir when unset.
    pub data_dir: Option<PathBuf>,
    pub defaults: ContestDefaults,
}

/// Raw TOML shape; every field optional so partial files work.
#[derive(Debug, Deserialize)]
struct EngineConfigToml {
    #[serde(default)]
    data_dir: Option<PathBuf>,
    #[serde(default)]
    contest: ContestDefaultsToml,
}

#[derive(Debug, Default, Deserialize)]
struct ContestDefaultsToml {
    required_hours: Option<u32>,
    max_daily_hours: Option<f64>,
    afternoon_start: Option<String>,
    afternoon_end: Option<String>,
    night_start: Option<String>,
    night_end: Option<String>,
    afternoon_winners: Option<u32>,
    night_vip_winners: Option<u32>,
}

impl EngineConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a config file, or fall back to built-in defaults when the
    /// file does not exist. Parse errors still surface.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse config directly from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: EngineConfigToml = toml::from_str(content)?;
        let base = ContestDefaults::default();

        let afternoon = PeriodWindow::new(
            parse_hhmm_or("afternoon_start", raw.contest.afternoon_start, base.afternoon.start)?,
            parse_hhmm_or("afternoon_end", raw.contest.afternoon_end, base.afternoon.end)?,
        );
        let night = PeriodWindow::new(
            parse_hhmm_or("night_start", raw.contest.night_start, base.night.start)?,
            parse_hhmm_or("night_end", raw.contest.night_end, base.night.end)?,
        );

        Ok(Self {
            data_dir: raw.data_dir,
            defaults: ContestDefaults {
                required_hours: raw.contest.required_hours.unwrap_or(base.required_hours),
                max_daily_hours: raw.contest.max_daily_hours.unwrap_or(base.max_daily_hours),
                afternoon,
                night,
                afternoon_winners: raw
                    .contest
                    .afternoon_winners
                    .unwrap_or(base.afternoon_winners),
                night_vip_winners: raw
                    .contest
                    .night_vip_winners
                    .unwrap_or(base.night_vip_winners),
            },
        })
    }

    /// Resolved path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        let dir = self
            .data_dir
            .clone()
            .or_else(|| {
                ProjectDirs::from("", "", "patrol-core").map(|dirs| dirs.data_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(DB_FILE_NAME)
    }
}

/// Parse an `HH:MM` (or `HH:MM:SS`) string, falling back when absent.
fn parse_hhmm_or(
    field: &'static str,
    value: Option<String>,
    fallback: NaiveTime,
) -> Result<NaiveTime, ConfigError> {
    match value {
        None => Ok(fallback),
        Some(text) => NaiveTime::parse_from_str(&text, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S"))
            .map_err(|_| ConfigError::InvalidTime { field, value: text }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_builtin_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.defaults.required_hours, 18);
        assert!((config.defaults.max_daily_hours - 4.5).abs() < 1e-9);
        assert_eq!(config.defaults.afternoon, PeriodWindow::from_hm(13, 0, 18, 0));
        assert_eq!(config.defaults.night, PeriodWindow::from_hm(19, 0, 0, 0));
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
data_dir = "/var/lib/patrol"

[contest]
required_hours = 24
max_daily_hours = 6.0
afternoon_start = "14:00"
afternoon_end = "19:00"
night_start = "20:00"
night_end = "01:00"
afternoon_winners = 5
night_vip_winners = 3
"#;
        let config = EngineConfig::from_toml(toml).unwrap();
        assert_eq!(config.data_dir.as_deref(), Some(Path::new("/var/lib/patrol")));
        assert_eq!(config.defaults.required_hours, 24);
        assert_eq!(config.defaults.afternoon, PeriodWindow::from_hm(14, 0, 19, 0));
        assert_eq!(config.defaults.night, PeriodWindow::from_hm(20, 0, 1, 0));
        assert!(config.defaults.night.crosses_midnight());
        assert_eq!(config.defaults.afternoon_winners, 5);
        assert_eq!(config.database_path(), Path::new("/var/lib/patrol/patrol.db"));
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let toml = r#"
[contest]
required_hours = 12
"#;
        let config = EngineConfig::from_toml(toml).unwrap();
        assert_eq!(config.defaults.required_hours, 12);
        assert!((config.defaults.max_daily_hours - 4.5).abs() < 1e-9);
        assert_eq!(config.defaults.afternoon_winners, 3);
    }

    #[test]
    fn test_invalid_time_is_rejected() {
        let toml = r#"
[contest]
afternoon_start = "25:99"
"#;
        let result = EngineConfig::from_toml(toml);
        assert!(matches!(result, Err(ConfigError::InvalidTime { .. })));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.defaults.required_hours, 18);
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patrol.toml");
        std::fs::write(&path, "[contest]\nnight_vip_winners = 4\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.defaults.night_vip_winners, 4);
    }

    #[test]
    fn test_defaults_apply_to_contest() {
        use chrono::{Duration, Utc};

        let mut defaults = ContestDefaults::default();
        defaults.required_hours = 30;
        defaults.afternoon_winners = 1;

        let now = Utc::now();
        let mut contest = Contest::new(
            "guild-1".to_string(),
            "Drive".to_string(),
            now,
            now + Duration::days(7),
        );
        defaults.apply(&mut contest);
        assert_eq!(contest.required_hours, 30);
        assert_eq!(contest.afternoon_winners, 1);
    }
}
