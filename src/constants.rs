//! Global constants used throughout the depmap codebase.
//!
//! This module contains registry defaults, timeout durations, retry parameters,
//! and parallelism settings that are used across multiple modules.

/// Public npm registry used when no registry URL is configured.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Default address the HTTP server binds to.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Default timeout for a single registry request, in seconds.
///
/// Covers the whole request including reading the response body.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default timeout for establishing a registry connection, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60;

/// Default number of retries for transient registry failures.
pub const DEFAULT_FETCH_RETRIES: usize = 3;

/// Maximum backoff delay for exponential backoff (500ms).
///
/// Exponential backoff delays are capped at this value to prevent
/// excessive wait times during retry operations.
pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

/// Starting delay for exponential backoff (10ms).
///
/// This is the initial delay used in exponential backoff calculations,
/// which doubles on each retry attempt.
pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;

/// Minimum number of concurrent registry requests regardless of CPU count.
///
/// Registry lookups are I/O-bound, so even single-core machines benefit
/// from several requests in flight.
pub const MIN_PARALLELISM: usize = 10;

/// Multiplier applied to CPU core count for default parallelism.
pub const PARALLELISM_CORE_MULTIPLIER: usize = 2;

/// Default CPU core count when detection fails.
///
/// Used as a fallback when `std::thread::available_parallelism()` returns an error.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Default number of concurrent registry requests: max(10, 2 × CPU cores).
pub fn default_max_concurrency() -> usize {
    let cores = std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(FALLBACK_CORE_COUNT);
    std::cmp::max(MIN_PARALLELISM, cores * PARALLELISM_CORE_MULTIPLIER)
}
