//! HTTP registry client.
//!
//! Requests `GET {base}/{name}/{search}` and decodes the JSON body into a
//! [`RegistryPackage`]. Scoped names keep their `@` and have the `/` encoded,
//! so `@types/node` at `^20.0.0` is requested as `{base}/@types%2Fnode/20.0.0`.
//!
//! # Retry Strategy
//!
//! - Initial delay: 10ms
//! - Max delay: 500ms
//! - Max retries: `fetch_retries` from the configuration
//!
//! Only transient failures are retried (see [`RegistryError::is_transient`]).
//! A `404` or a malformed payload fails immediately.

use reqwest::Url;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

use super::{Registry, RegistryError, RegistryPackage};
use crate::config::DepmapConfig;
use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};

/// Registry client backed by a pooled [`reqwest::Client`].
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: Url,
    retries: usize,
}

impl RegistryClient {
    /// Build a client from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn from_config(config: &DepmapConfig) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(concat!("depmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| RegistryError::Request {
                url: config.registry_url.clone(),
                source,
            })?;

        Self::with_client(client, &config.registry_url, config.fetch_retries)
    }

    /// Build a client around an existing [`reqwest::Client`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidUrl`] if `base_url` cannot hold path segments.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        retries: usize,
    ) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_string()));
        }

        Ok(Self {
            client,
            base_url,
            retries,
        })
    }

    /// The base registry URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// URL requested for `name` at `search`.
    pub fn package_url(&self, name: &str, search: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name).push(search);
        }
        url
    }

    async fn fetch_once(&self, url: &Url) -> Result<RegistryPackage, RegistryError> {
        let response = self.client.get(url.clone()).send().await.map_err(|source| {
            RegistryError::Request {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<RegistryPackage>().await.map_err(|source| {
            if source.is_decode() {
                RegistryError::Decode {
                    url: url.to_string(),
                    reason: source.to_string(),
                }
            } else {
                RegistryError::Request {
                    url: url.to_string(),
                    source,
                }
            }
        })
    }
}

impl Registry for RegistryClient {
    async fn fetch(&self, name: &str, search: &str) -> Result<RegistryPackage, RegistryError> {
        let url = self.package_url(name, search);
        debug!("Querying registry for {}:{} ({})", name, search, url);

        let strategy = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(self.retries);

        RetryIf::spawn(
            strategy,
            || self.fetch_once(&url),
            |error: &RegistryError| {
                let retry = error.is_transient();
                if retry {
                    debug!("Retrying {}: {}", url, error);
                }
                retry
            },
        )
        .await
    }
}
