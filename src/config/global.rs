//! User configuration for depmap.
//!
//! The configuration file is optional and every key has a default, so an
//! empty file (or no file at all) gives the stock behaviour: the public npm
//! registry, a 60 second request timeout and no cycle or depth guards.
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.depmap/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\depmap\config.toml`
//! - **Override**: `depmap --config <path>`
//!
//! # Example
//!
//! ```toml
//! registry_url = "https://registry.npmjs.org"
//! request_timeout_secs = 30
//! fetch_retries = 2
//! max_concurrency = 32
//! tree_deadline_secs = 120
//! cycle_guard = true
//! max_depth = 25
//! bind_address = "0.0.0.0:8080"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_FETCH_RETRIES,
    DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT_SECS, default_max_concurrency,
};
use crate::core::DepmapError;

/// depmap settings, loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepmapConfig {
    /// Base URL of the package registry.
    ///
    /// Package metadata is requested from `{registry_url}/{name}/{search token}`.
    pub registry_url: String,

    /// Timeout for one registry request, in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for establishing a registry connection, in seconds.
    pub connect_timeout_secs: u64,

    /// How many times a transient registry failure is retried.
    pub fetch_retries: usize,

    /// Maximum number of registry requests in flight.
    ///
    /// Defaults to max(10, 2 × CPU cores) when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// Deadline for building one tree, in seconds.
    ///
    /// Packages not fetched before the deadline become leaves. Unlimited when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_deadline_secs: Option<u64>,

    /// Turn a package that reappears on its own ancestor path into a leaf.
    pub cycle_guard: bool,

    /// Packages deeper than this become leaves. Unlimited when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Address `depmap serve` listens on.
    pub bind_address: String,
}

impl Default for DepmapConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            fetch_retries: DEFAULT_FETCH_RETRIES,
            max_concurrency: None,
            tree_deadline_secs: None,
            cycle_guard: false,
            max_depth: None,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

impl DepmapConfig {
    /// Load configuration from an optional path.
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// and a missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicit path does not exist
    /// - The file cannot be read or contains invalid TOML
    /// - A value fails validation
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(DepmapError::ConfigNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            return Self::load_from(&path).await;
        }

        match Self::default_path() {
            Ok(path) if path.exists() => Self::load_from(&path).await,
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or a
    /// value fails validation.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default file path for the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("depmap")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".depmap")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Check values that TOML typing alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`DepmapError::ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), DepmapError> {
        let invalid = |message: String| DepmapError::ConfigError {
            message,
        };

        if !(self.registry_url.starts_with("http://") || self.registry_url.starts_with("https://"))
        {
            return Err(invalid(format!(
                "registry_url must be an http(s) URL, got '{}'",
                self.registry_url
            )));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(invalid("timeouts must be at least one second".to_string()));
        }
        if self.max_concurrency == Some(0) {
            return Err(invalid("max_concurrency must be at least 1".to_string()));
        }
        if self.tree_deadline_secs == Some(0) {
            return Err(invalid("tree_deadline_secs must be at least one second".to_string()));
        }
        self.bind_socket_addr()?;
        Ok(())
    }

    /// Parsed [`Self::bind_address`].
    ///
    /// # Errors
    ///
    /// Returns [`DepmapError::ConfigError`] if the address is not `host:port`.
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, DepmapError> {
        self.bind_address.parse().map_err(|e| DepmapError::ConfigError {
            message: format!("invalid bind_address '{}': {e}", self.bind_address),
        })
    }

    /// Per-request registry timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Registry connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Effective registry concurrency.
    pub fn effective_max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or_else(default_max_concurrency)
    }

    /// Tree build deadline, if any.
    pub fn tree_deadline(&self) -> Option<Duration> {
        self.tree_deadline_secs.map(Duration::from_secs)
    }
}
