//! Dashboard configuration.
//!
//! Settings are read from a JSON file; every field is optional and falls
//! back to the defaults below.

use crate::data::LoadOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";
/// Environment variable for the configuration file path.
pub const CONFIG_ENV_VAR: &str = "SALES_DASHBOARD_CONFIG";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "SALES_DASHBOARD_LOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("CSV separator must be a single ASCII character, got '{0}'")]
    InvalidSeparator(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dataset_path: PathBuf,
    pub separator: String,
    pub decimal_comma: bool,
    pub date_format: String,
    pub currency_symbol: String,
    pub export_dir: PathBuf,
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let load = LoadOptions::default();
        Self {
            dataset_path: PathBuf::from("supermarket_sales.csv"),
            separator: char::from(load.separator).to_string(),
            decimal_comma: load.decimal_comma,
            date_format: load.date_format,
            currency_symbol: "R$".to_string(),
            export_dir: PathBuf::from("charts"),
            export_width: 1200,
            export_height: 700,
        }
    }
}

impl DashboardConfig {
    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.load_options()?;
        Ok(config)
    }

    /// Resolve the config: explicit path, then the environment variable,
    /// then `dashboard.json` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let path = explicit.map(Path::to_path_buf).or(from_env).or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        });

        match path {
            Some(path) => {
                info!(path = %path.display(), "Loading dashboard config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// CSV layout options for the loader.
    pub fn load_options(&self) -> Result<LoadOptions, ConfigError> {
        let separator = match self.separator.as_bytes() {
            [byte] if byte.is_ascii() => *byte,
            _ => return Err(ConfigError::InvalidSeparator(self.separator.clone())),
        };

        Ok(LoadOptions {
            separator,
            decimal_comma: self.decimal_comma,
            date_format: self.date_format.clone(),
        })
    }

    pub fn export_size(&self) -> (u32, u32) {
        (self.export_width, self.export_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_loader_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.load_options().unwrap(), LoadOptions::default());
        assert_eq!(config.currency_symbol, "R$");
        assert_eq!(config.export_size(), (1200, 700));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "dataset_path": "data/sales.csv", "date_format": "%m/%d/%Y" }}"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("data/sales.csv"));
        assert_eq!(config.load_options().unwrap().date_format, "%m/%d/%Y");
        assert_eq!(config.separator, ";");
        assert!(config.decimal_comma);
    }

    #[test]
    fn explicit_path_wins() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "currency_symbol": "$" }}"#).unwrap();

        let config = DashboardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.currency_symbol, "$");
    }

    #[test]
    fn invalid_separator_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "separator": ";;" }}"#).unwrap();

        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(ConfigError::InvalidSeparator(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        assert!(matches!(
            DashboardConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
