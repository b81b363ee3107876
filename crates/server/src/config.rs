//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Log filter used when `RUST_LOG` is unset
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "debug",
            Environment::Testing => "info",
            Environment::Production => "warn",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Regression artifact to load at startup
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Expected SHA-256 of the artifact, hex encoded
    #[serde(default)]
    pub model_sha256: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Version reported by the health endpoint
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Seconds between artifact load attempts after a failure; 0 disables retry
    #[serde(default = "default_load_retry_secs")]
    pub load_retry_secs: u64,

    /// Origins allowed to call the API from a browser; `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/vehicle_price_model.json")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_api_version() -> String {
    "1.0.0".to_string()
}

fn default_load_retry_secs() -> u64 {
    30
}

pub(crate) fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:5000".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            model_sha256: None,
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            api_version: default_api_version(),
            load_retry_secs: default_load_retry_secs(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `carprice.*` file and
    /// `CARPRICE_*` environment variables, the latter taking precedence.
    /// `CARPRICE_CORS_ORIGINS` is a comma-separated list.
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("carprice").required(false))
            .add_source(
                config::Environment::with_prefix("CARPRICE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            );
        Self::from_builder(builder)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let config = builder.build().context("Failed to read configuration")?;
        config
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Delay between load attempts, or `None` when retrying is disabled
    pub fn load_retry_interval(&self) -> Option<Duration> {
        (self.load_retry_secs > 0).then(|| Duration::from_secs(self.load_retry_secs))
    }
}
