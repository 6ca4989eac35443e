//! Test utilities for depmap
//!
//! This module provides helpers shared by unit and integration tests:
//! - [`init_test_logging`] - one-time tracing setup that respects `RUST_LOG`
//! - [`StaticRegistry`] - an in-memory [`Registry`] with fetch accounting,
//!   injectable failures and latency
//!
//! # Example
//!
//! ```rust,ignore
//! use depmap_cli::test_utils::StaticRegistry;
//!
//! let registry = StaticRegistry::new()
//!     .with_exact("a", "1.0.0", [("b", "^2.0.0")])
//!     .with_package("b", "2.0.0", "2.1.0", Vec::<(&str, &str)>::new());
//! assert_eq!(registry.fetch_count(), 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::registry::{Registry, RegistryError, RegistryPackage};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer() // Important: uses test-compatible writer
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// In-memory registry keyed by `(name, search token)`.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    packages: HashMap<(String, String), RegistryPackage>,
    failing: HashSet<String>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}

impl StaticRegistry {
    /// An empty registry; every lookup fails with [`RegistryError::NotFound`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer lookups of `name` at `search` with version `resolved`.
    #[must_use]
    pub fn with_package<I, K, V>(mut self, name: &str, search: &str, resolved: &str, deps: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.packages.insert(
            (name.to_string(), search.to_string()),
            RegistryPackage::new(name, resolved, deps),
        );
        self
    }

    /// Answer lookups of `name` at exactly `version`.
    #[must_use]
    pub fn with_exact<I, K, V>(self, name: &str, version: &str, deps: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_package(name, version, version, deps)
    }

    /// Make every lookup of `name` fail with a `500` status.
    #[must_use]
    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Delay every lookup by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Total number of lookups served, including failures.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of lookups for `name`.
    pub fn fetches_for(&self, name: &str) -> usize {
        self.requests
            .lock()
            .map(|requests| requests.iter().filter(|(n, _)| n == name).count())
            .unwrap_or(0)
    }

    /// Highest number of lookups that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Registry for StaticRegistry {
    async fn fetch(&self, name: &str, search: &str) -> Result<RegistryPackage, RegistryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((name.to_string(), search.to_string()));
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(name) {
            return Err(RegistryError::Status {
                url: format!("static:///{name}/{search}"),
                status: 500,
            });
        }

        self.packages.get(&(name.to_string(), search.to_string())).cloned().ok_or_else(|| {
            RegistryError::NotFound {
                name: name.to_string(),
                search: search.to_string(),
            }
        })
    }
}
