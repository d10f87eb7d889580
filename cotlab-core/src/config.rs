//! TOML configuration for endpoints, timeouts and request defaults.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration pointed at the public CFTC endpoints.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CotConfig {
    pub http: HttpConfig,
    pub cftc: CftcConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout for generic CSV URLs.
    pub csv_timeout_secs: u64,
    /// Timeout for the CFTC API, bulk CSV and yearly archives.
    pub bulk_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            csv_timeout_secs: 30,
            bulk_timeout_secs: 60,
            user_agent: format!("cotlab/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn csv_timeout(&self) -> Duration {
        Duration::from_secs(self.csv_timeout_secs)
    }

    pub fn bulk_timeout(&self) -> Duration {
        Duration::from_secs(self.bulk_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CftcConfig {
    pub api_base: String,
    pub bulk_base: String,
    pub history_base: String,
    /// `$limit` sent to the JSON API.
    pub default_limit: usize,
    /// `$order` sent to the JSON API.
    pub default_order: String,
}

impl Default for CftcConfig {
    fn default() -> Self {
        Self {
            api_base: "https://publicreporting.cftc.gov/resource/".into(),
            bulk_base: "https://publicreporting.cftc.gov/api/views/".into(),
            history_base: "https://www.cftc.gov/files/dea/history/".into(),
            default_limit: 5000,
            default_order: "report_date_as_yyyy_mm_dd DESC".into(),
        }
    }
}

impl CotConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn api_url(&self, dataset_id: &str) -> String {
        format!("{}{dataset_id}.json", self.cftc.api_base)
    }

    pub fn bulk_url(&self, dataset_id: &str) -> String {
        format!("{}{dataset_id}/rows.csv", self.cftc.bulk_base)
    }
}
