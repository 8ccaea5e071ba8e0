use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

const APP_DIRECTORY: &str = "music-catalog";
const DEFAULT_API_URL: &str = "http://localhost:8000/api/";
const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the catalog REST API
    #[serde(default = "default_api_url")]
    api_url: String,
    /// Per-request timeout, e.g. "10s" or "1m 30s"
    #[serde(default = "default_request_timeout")]
    request_timeout: String,
    /// Where the session cookie is kept between runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_file: Option<String>,
    #[serde(default = "default_log_level")]
    log_level: String,
    /// OTLP collector endpoint; tracing export is off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    otlp_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout: default_request_timeout(),
            session_file: None,
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIRECTORY).join("config.toml"))
    }

    /// Load the default config file, falling back to built-in defaults when
    /// it doesn't exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Write the default config file, unless one already exists
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or(eyre!("No config directory on this platform"))?;
        Self::default().write_if_missing(&path)?;
        Ok(path)
    }

    fn write_if_missing(&self, path: &Path) -> Result<()> {
        if path.exists() {
            tracing::info!("Config already exists at {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }
        self
    }

    pub fn api_url(&self) -> Result<Url> {
        Url::parse(&self.api_url).wrap_err_with(|| format!("Invalid api_url: {}", self.api_url))
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.request_timeout)
            .wrap_err_with(|| format!("Invalid request_timeout: {}", self.request_timeout))
    }

    pub fn session_file_path(&self) -> Option<PathBuf> {
        match &self.session_file {
            Some(path) => Some(self.expand_path(path)),
            None => dirs::data_dir().map(|path| path.join(APP_DIRECTORY).join("session")),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.otlp_endpoint.as_deref()
    }
}
