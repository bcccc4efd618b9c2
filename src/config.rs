//! Dashboard Configuration Module
//! Layered settings: built-in defaults, optional JSON file, environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Public historical automobile sales dataset.
pub const DEFAULT_DATA_SOURCE: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMDeveloperSkillsNetwork-DV0101EN-SkillsNetwork/Data%20Files/historical_automobile_sales.csv";

/// Config file looked up in the working directory when `AUTOSALES_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "autosales_dashboard.json";

pub const ENV_CONFIG_PATH: &str = "AUTOSALES_CONFIG";
pub const ENV_DATA_SOURCE: &str = "AUTOSALES_DATA_SOURCE";
pub const ENV_DEFAULT_YEAR: &str = "AUTOSALES_DEFAULT_YEAR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidOverride { key: &'static str, value: String },
}

/// Runtime settings for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// CSV location: http(s) URL or local file path
    pub data_source: String,
    /// Year preselected in the year dropdown
    pub default_year: Option<i32>,
    pub fetch_timeout_secs: u64,
    pub window_width: f32,
    pub window_height: f32,
    pub export_width: u32,
    pub export_height: u32,
    pub open_after_export: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            default_year: Some(2022),
            fetch_timeout_secs: 30,
            window_width: 1400.0,
            window_height: 900.0,
            export_width: 1600,
            export_height: 1200,
            open_after_export: true,
        }
    }
}

impl DashboardConfig {
    /// Resolve the full configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let explicit = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup(ENV_DATA_SOURCE) {
            let source = source.trim();
            if source.is_empty() {
                return Err(ConfigError::InvalidOverride {
                    key: ENV_DATA_SOURCE,
                    value: source.to_string(),
                });
            }
            self.data_source = source.to_string();
        }

        if let Some(year) = lookup(ENV_DEFAULT_YEAR) {
            let parsed = year
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: ENV_DEFAULT_YEAR,
                    value: year.clone(),
                })?;
            self.default_year = Some(parsed);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            DashboardConfig::from_json(r#"{ "data_source": "data/sales.csv", "default_year": 1990 }"#)
                .unwrap();
        assert_eq!(config.data_source, "data/sales.csv");
        assert_eq!(config.default_year, Some(1990));
        assert_eq!(config.export_width, 1600);
        assert!(config.open_after_export);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = DashboardConfig::from_json("{ data_source: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_DATA_SOURCE, " /tmp/sales.csv "),
            (ENV_DEFAULT_YEAR, "2008"),
        ]);
        let mut config = DashboardConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.data_source, "/tmp/sales.csv");
        assert_eq!(config.default_year, Some(2008));
    }

    #[test]
    fn bad_year_override_is_an_error() {
        let mut config = DashboardConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_DEFAULT_YEAR).then(|| "twenty".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOverride { key: ENV_DEFAULT_YEAR, .. }
        ));
        assert_eq!(config.default_year, Some(2022));
    }

    #[test]
    fn no_overrides_leaves_config_untouched() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(|_| None).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }
}
