//! Configuration management
//!
//! Default config file: ./catalog.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable overriding `elasticsearch.url`
pub const URL_ENV: &str = "CATALOG_ES_URL";

/// Environment variable overriding `observability.log_format`
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ElasticsearchConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Refresh the index after writes so the next search sees them
    #[serde(default = "default_true")]
    pub refresh_on_write: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            refresh_on_write: true,
            auth: None,
        }
    }
}

impl ElasticsearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    Basic { username: String, password: String },
    ApiKey { id: String, api_key: String },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info,catalog=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Log output format: "pretty" or "json"
    /// Override with LOG_FORMAT env var
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Load config from file path, or create default, then apply environment overrides
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        Self::load_or_create_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// [`load_or_create`](Self::load_or_create) with overrides read through `env`
    pub fn load_or_create_with_env(
        config_path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            // Writing the default file is best effort
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Err(e) = config.save(config_path) {
                tracing::debug!("Could not write default config to {:?}: {}", config_path, e);
            }
            config
        };

        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(url) = env(URL_ENV).filter(|v| !v.is_empty()) {
            self.elasticsearch.url = url;
        }
        if let Some(format) = env(LOG_FORMAT_ENV).filter(|v| !v.is_empty()) {
            self.observability.log_format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.elasticsearch.url)?;
        if self.elasticsearch.timeout_secs == 0 {
            return Err(Error::Config("elasticsearch.timeout_secs must be > 0".into()));
        }
        match self.observability.log_format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(Error::Config(format!(
                "observability.log_format must be \"pretty\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }
}
