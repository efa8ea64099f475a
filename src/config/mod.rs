//! Configuration management for cepquote
//!
//! This module handles loading and validating configuration from defaults,
//! environment variables and TOML files. Every section is passed explicitly
//! to the component that needs it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lookup::{brasilapi, viacep};
use crate::utils::parse_http_url;

/// Default exchange-rate endpoint
pub const DEFAULT_QUOTE_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CEP race configuration
    pub lookup: LookupConfig,

    /// Quote server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Quote client configuration
    pub client: ClientConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// CEP race configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Overall race deadline in milliseconds
    pub race_timeout_ms: u64,

    /// Per-upstream request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// BrasilAPI base URL
    pub brasilapi_url: String,

    /// ViaCEP base URL
    pub viacep_url: String,
}

/// Quote server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Exchange-rate endpoint
    pub quote_url: String,

    /// Exchange-rate request timeout in milliseconds
    pub quote_timeout_ms: u64,

    /// Enable request logging
    pub enable_request_logging: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,

    /// Insert timeout in milliseconds
    pub write_timeout_ms: u64,
}

/// Quote client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Quote server base URL
    pub server_url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// File the quote is written to
    pub output_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            race_timeout_ms: 1000,
            request_timeout_ms: 900,
            brasilapi_url: brasilapi::DEFAULT_BASE_URL.to_string(),
            viacep_url: viacep::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            quote_url: DEFAULT_QUOTE_URL.to_string(),
            quote_timeout_ms: 2000,
            enable_request_logging: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("cotacao.db"),
            write_timeout_ms: 100,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::from("http://localhost:8080"),
            timeout_ms: 300,
            output_path: PathBuf::from("cotacao.txt"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl LookupConfig {
    /// Race deadline as Duration
    #[must_use]
    pub fn race_timeout(&self) -> Duration {
        Duration::from_millis(self.race_timeout_ms)
    }

    /// Per-upstream timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ServerConfig {
    /// Exchange-rate timeout as Duration
    #[must_use]
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }
}

impl DatabaseConfig {
    /// Insert timeout as Duration
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl ClientConfig {
    /// Client timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Read an environment variable and parse it, ignoring unparsable values
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `CEPQUOTE_*` environment variables
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("CEPQUOTE_RACE_TIMEOUT_MS") {
            self.lookup.race_timeout_ms = v;
        }
        if let Some(v) = env_parse("CEPQUOTE_REQUEST_TIMEOUT_MS") {
            self.lookup.request_timeout_ms = v;
        }
        if let Ok(v) = std::env::var("CEPQUOTE_BRASILAPI_URL") {
            self.lookup.brasilapi_url = v;
        }
        if let Ok(v) = std::env::var("CEPQUOTE_VIACEP_URL") {
            self.lookup.viacep_url = v;
        }

        if let Some(v) = env_parse("CEPQUOTE_BIND_ADDRESS") {
            self.server.bind_address = v;
        }
        if let Ok(v) = std::env::var("CEPQUOTE_QUOTE_URL") {
            self.server.quote_url = v;
        }
        if let Some(v) = env_parse("CEPQUOTE_QUOTE_TIMEOUT_MS") {
            self.server.quote_timeout_ms = v;
        }

        if let Ok(v) = std::env::var("CEPQUOTE_SQLITE_PATH") {
            self.database.sqlite_path = v.into();
        }
        if let Some(v) = env_parse("CEPQUOTE_DB_TIMEOUT_MS") {
            self.database.write_timeout_ms = v;
        }

        if let Ok(v) = std::env::var("CEPQUOTE_SERVER_URL") {
            self.client.server_url = v;
        }
        if let Some(v) = env_parse("CEPQUOTE_CLIENT_TIMEOUT_MS") {
            self.client.timeout_ms = v;
        }
        if let Ok(v) = std::env::var("CEPQUOTE_OUTPUT_PATH") {
            self.client.output_path = v.into();
        }

        if let Ok(v) = std::env::var("CEPQUOTE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("CEPQUOTE_LOG_FORMAT") {
            self.logging.format = v;
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.lookup.race_timeout_ms == 0 {
            anyhow::bail!("lookup.race_timeout_ms must be greater than 0");
        }

        if self.lookup.request_timeout_ms == 0 {
            anyhow::bail!("lookup.request_timeout_ms must be greater than 0");
        }

        if self.lookup.request_timeout_ms > self.lookup.race_timeout_ms {
            anyhow::bail!("lookup.request_timeout_ms must not exceed lookup.race_timeout_ms");
        }

        if self.server.quote_timeout_ms == 0 {
            anyhow::bail!("server.quote_timeout_ms must be greater than 0");
        }

        if self.database.write_timeout_ms == 0 {
            anyhow::bail!("database.write_timeout_ms must be greater than 0");
        }

        if self.client.timeout_ms == 0 {
            anyhow::bail!("client.timeout_ms must be greater than 0");
        }

        parse_http_url(&self.lookup.brasilapi_url).context("lookup.brasilapi_url")?;
        parse_http_url(&self.lookup.viacep_url).context("lookup.viacep_url")?;
        parse_http_url(&self.server.quote_url).context("server.quote_url")?;
        parse_http_url(&self.client.server_url).context("client.server_url")?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        Ok(())
    }
}
