//! Package registry access.
//!
//! The tree builder only needs one operation from a registry: given a package
//! name and a search token, return the version the registry picked and the
//! dependencies that version declares. That operation is the [`Registry`]
//! trait, so the builder can be driven by the HTTP [`RegistryClient`] in
//! production and by an in-memory registry in tests.
//!
//! Every failure mode (network error, non-2xx status, malformed payload) is a
//! [`RegistryError`]. The builder treats all of them the same way: the package
//! becomes a leaf node.

mod client;

pub use client::RegistryClient;

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

/// Metadata for one resolved package version.
///
/// Unknown fields in the registry payload are ignored; a missing or `null`
/// `dependencies` field means the package has no dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryPackage {
    /// Package name as reported by the registry
    pub name: String,
    /// Concrete version the registry resolved the search token to
    pub version: String,
    /// Declared runtime dependencies, name → version expression
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: BTreeMap<String, String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl RegistryPackage {
    /// Convenience constructor, mostly for in-memory registries.
    pub fn new<I, K, V>(name: impl Into<String>, version: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: dependencies.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Errors returned by a registry lookup.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The HTTP request could not be completed
    #[error("Registry request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered with a non-success status
    #[error("Registry returned HTTP {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body was not valid package metadata
    #[error("Invalid package metadata from {url}: {reason}")]
    Decode {
        /// Requested URL
        url: String,
        /// Decoder error message
        reason: String,
    },

    /// The package or version does not exist
    #[error("Package '{name}' has no version matching '{search}'")]
    NotFound {
        /// Package name
        name: String,
        /// Search token that matched nothing
        search: String,
    },

    /// The registry URL could not be built
    #[error("Invalid registry URL '{url}': {reason}")]
    InvalidUrl {
        /// Configured base URL
        url: String,
        /// Why the URL was rejected
        reason: String,
    },
}

impl RegistryError {
    /// Whether retrying the same request could succeed.
    ///
    /// Connection failures, timeouts, `429` and `5xx` responses are transient;
    /// everything else is not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request {
                source,
                ..
            } => source.is_timeout() || source.is_connect() || source.is_request(),
            Self::Status {
                status,
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A source of package metadata.
///
/// Implementations must be shareable across the tree builder's tasks.
pub trait Registry: Send + Sync + 'static {
    /// Fetch `name` at the version the registry selects for `search`.
    fn fetch(
        &self,
        name: &str,
        search: &str,
    ) -> impl Future<Output = Result<RegistryPackage, RegistryError>> + Send;
}
