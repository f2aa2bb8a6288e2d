//! Service configuration
//!
//! Layered as: defaults, optional TOML file, environment (after `.env` has
//! been loaded by the binary), then CLI overrides applied by the caller.

use atelier_store::BucketNames;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: `{value}`")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} is not configured")]
    Missing(&'static str),

    #[error("allowed origin must be `*` or an http(s) origin, got `{0}`")]
    InvalidOrigin(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub capabilities: CapabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Browser origin allowed by CORS; `*` allows any
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the storage REST API
    pub endpoint: String,
    pub service_key: String,
    pub buckets: BucketNames,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Empty disables enhancement; every image then falls back
    pub enhancer_api_key: String,
    pub enhancer_endpoint: String,
    pub enhancer_model: String,
    pub enhancement_timeout_secs: u64,
    /// Empty selects a stand-in that fails every run at the angle phase
    pub angle_endpoint: String,
    /// Empty selects a stand-in that fails every run at the video phase
    pub video_endpoint: String,
    /// Bearer token for the synthesis endpoints
    pub capability_api_key: String,
    pub synthesis_timeout_secs: u64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            enhancer_api_key: String::new(),
            enhancer_endpoint: atelier_capability::GenerativeImageConfig::DEFAULT_ENDPOINT.to_string(),
            enhancer_model: atelier_capability::GenerativeImageConfig::DEFAULT_MODEL.to_string(),
            enhancement_timeout_secs: 60,
            angle_endpoint: String::new(),
            video_endpoint: String::new(),
            capability_api_key: String::new(),
            synthesis_timeout_secs: 300,
        }
    }
}

impl CapabilityConfig {
    #[inline]
    #[must_use]
    pub fn enhancement_timeout(&self) -> Duration {
        Duration::from_secs(self.enhancement_timeout_secs)
    }

    #[inline]
    #[must_use]
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

impl ServiceConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; absent keys keep their defaults
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on invalid TOML.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns `ConfigError::Read` if the file cannot be read, or
    /// `ConfigError::Parse` on invalid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Overlay values from the process environment
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if `PORT` is not a port number.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; blank values are ignored
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if `PORT` is not a port number.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: port.clone(),
            })?;
        }

        let strings: [(&str, &mut String); 8] = [
            ("ALLOWED_ORIGIN", &mut self.server.allowed_origin),
            ("STORAGE_URL", &mut self.storage.endpoint),
            ("STORAGE_SERVICE_KEY", &mut self.storage.service_key),
            ("GEMINI_API_KEY", &mut self.capabilities.enhancer_api_key),
            ("GEMINI_MODEL", &mut self.capabilities.enhancer_model),
            ("ANGLE_SYNTHESIS_URL", &mut self.capabilities.angle_endpoint),
            ("VIDEO_SYNTHESIS_URL", &mut self.capabilities.video_endpoint),
            ("CAPABILITY_API_KEY", &mut self.capabilities.capability_api_key),
        ];
        for (name, field) in strings {
            if let Some(value) = var(name) {
                *field = value.trim().to_string();
            }
        }
        Ok(())
    }

    /// Check the settings the service cannot start without
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` for an absent storage endpoint or key,
    /// and `ConfigError::InvalidOrigin` for a malformed allowed origin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("storage endpoint (STORAGE_URL)"));
        }
        if self.storage.service_key.trim().is_empty() {
            return Err(ConfigError::Missing("storage service key (STORAGE_SERVICE_KEY)"));
        }
        if !is_valid_origin(&self.server.allowed_origin) {
            return Err(ConfigError::InvalidOrigin(self.server.allowed_origin.clone()));
        }
        Ok(())
    }
}

/// `*`, or `scheme://host[:port]` with no path
fn is_valid_origin(origin: &str) -> bool {
    if origin == "*" {
        return true;
    }
    let Some(rest) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    !rest.is_empty()
        && !rest.contains('/')
        && rest.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}
