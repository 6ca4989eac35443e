//! Configuration management for depmap
//!
//! depmap reads a single optional TOML file (see [`DepmapConfig`]). Command-line
//! flags override the file; the file overrides the built-in defaults.
//!
//! ```text
//! built-in defaults  <  ~/.depmap/config.toml (or --config)  <  CLI flags
//! ```

mod global;

pub use global::DepmapConfig;

use std::path::PathBuf;

/// Expand `~` and environment variables in a user-supplied config path.
///
/// Falls back to the raw string when expansion fails (for example an
/// undefined variable), so the later "not found" error shows what the user typed.
pub fn expand_config_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}
