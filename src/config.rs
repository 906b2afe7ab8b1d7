//! Service configuration
//!
//! JSON file with serde defaults for every field. Missing fields fall back
//! to defaults; a missing file is an error.

use std::fs;
use std::path::{Path, PathBuf};

use axum::http::{HeaderValue, Uri};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Severity};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONFIG_IO_ERROR",
            ConfigError::Parse { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::Invalid(_) => "CONFIG_INVALID",
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 54321)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Largest accepted `top` (default: 1000)
    #[serde(default = "default_max_top")]
    pub max_top: usize,

    /// Optional JSON file with catalog rows
    #[serde(default)]
    pub seed_path: Option<PathBuf>,

    /// Lowest log severity written (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    54321
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_max_top() -> usize {
    1000
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_top: default_max_top(),
            seed_path: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Loads and validates a config file.
    ///
    /// A relative `seed_path` is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let mut config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display.clone(),
            source,
        })?;

        if let (Some(seed), Some(dir)) = (config.seed_path.as_ref(), path.parent()) {
            if seed.is_relative() {
                config.seed_path = Some(dir.join(seed));
            }
        }

        config.validate()?;

        let port = config.port.to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("path", &display), ("port", &port)]);

        Ok(config)
    }

    /// Checks value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".into()));
        }
        if self.max_top == 0 {
            return Err(ConfigError::Invalid("max_top must be non-zero".into()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        self.cors_origin_values()?;
        Ok(())
    }

    /// Parses `cors_origins` into header values.
    ///
    /// Each entry must be a bare `scheme://host[:port]` origin.
    pub fn cors_origin_values(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.cors_origins
            .iter()
            .map(|origin| {
                let invalid = || ConfigError::Invalid(format!("invalid CORS origin '{}'", origin));
                let uri: Uri = origin.parse().map_err(|_| invalid())?;
                let bare = uri
                    .path_and_query()
                    .map_or(true, |pq| pq.as_str().is_empty() || pq.as_str() == "/");
                if uri.scheme().is_none() || uri.authority().is_none() || !bare {
                    return Err(invalid());
                }
                HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|_| invalid())
            })
            .collect()
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
