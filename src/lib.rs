//! depmap - transitive dependency trees for npm packages
//!
//! depmap takes a package name and a version expression, queries an
//! npm-compatible registry recursively and returns the full dependency tree
//! rooted at that package. It does no version solving: each dependency is
//! resolved independently by the registry, so a package may appear several
//! times at different versions.
//!
//! # Architecture Overview
//!
//! ```text
//! CLI / HTTP server
//!        │
//!        ▼
//! DependencyMapper ──► TreeBuilder ──► Registry (HTTP client)
//!                          │
//!                          ├─► Version parser
//!                          └─► TreeCache
//! ```
//!
//! - The tree builder expands every dependency in its own tokio task and joins
//!   the children before assembling the parent (fork-join).
//! - Subtrees are memoized in a shared [`cache::TreeCache`] keyed by
//!   `(name, resolved version)`; distinct expressions resolving to the same
//!   version share one subtree.
//! - A package the registry cannot answer for becomes a leaf. Only empty input
//!   is an error.
//!
//! # Core Modules
//!
//! - [`version`] - version expression parsing (search token extraction)
//! - [`models`] - the [`models::PackageNode`] tree and its JSON wire format
//! - [`cache`] - concurrent subtree memoization
//! - [`registry`] - the [`registry::Registry`] trait and its HTTP client
//! - [`resolver`] - the tree builder and the [`resolver::DependencyMapper`] facade
//!
//! ## Surfaces
//! - [`cli`] - the `depmap` command line
//! - [`server`] - the axum HTTP server
//!
//! ## Supporting Modules
//! - [`config`] - `~/.depmap/config.toml`
//! - [`core`] - error types and user-facing error rendering
//! - [`constants`] - defaults and tuning constants
//!
//! # Example
//!
//! ```rust,no_run
//! use depmap_cli::cache::TreeCache;
//! use depmap_cli::config::DepmapConfig;
//! use depmap_cli::resolver::DependencyMapper;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = DepmapConfig::default();
//! let mapper = DependencyMapper::from_config(&config, TreeCache::new())?;
//!
//! let tree = mapper.get_dependency_tree("express", "^4.18.0").await?;
//! println!("{}", serde_json::to_string_pretty(&tree)?);
//! # Ok(())
//! # }
//! ```

// Core functionality
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod resolver;

// Data model
pub mod models;
pub mod version;

// I/O
pub mod registry;
pub mod server;

// Test utilities (only compiled for tests or with the test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
