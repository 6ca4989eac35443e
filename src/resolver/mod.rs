//! Dependency tree resolution.
//!
//! [`DependencyMapper`] is the entry point used by the CLI and the HTTP
//! server. It validates the request, hands it to the [`TreeBuilder`] and logs
//! coarse progress. The builder does the real work; see [`tree_builder`] for
//! the traversal, caching and concurrency rules.
//!
//! # Example
//!
//! ```rust,no_run
//! use depmap_cli::cache::TreeCache;
//! use depmap_cli::config::DepmapConfig;
//! use depmap_cli::resolver::DependencyMapper;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mapper = DependencyMapper::from_config(&DepmapConfig::default(), TreeCache::new())?;
//! let tree = mapper.get_dependency_tree("express", "^4.18.0").await?;
//! println!("{} has {} direct dependencies", tree.name(), tree.dependencies().len());
//! # Ok(())
//! # }
//! ```

pub mod tree_builder;

pub use tree_builder::{BuildOptions, Expansion, TreeBuilder};

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::info;

use crate::cache::TreeCache;
use crate::config::DepmapConfig;
use crate::core::DepmapError;
use crate::models::PackageNode;
use crate::registry::{Registry, RegistryClient};

/// Builds dependency trees against a registry, sharing one cache across requests.
pub struct DependencyMapper<R: Registry = RegistryClient> {
    builder: TreeBuilder<R>,
}

impl<R: Registry> DependencyMapper<R> {
    /// Create a mapper over `registry`.
    pub fn new(registry: R, cache: TreeCache, options: BuildOptions) -> Self {
        Self {
            builder: TreeBuilder::new(registry, cache, options),
        }
    }

    /// The cache shared by every request of this mapper.
    pub fn cache(&self) -> &TreeCache {
        self.builder.cache()
    }

    /// The underlying registry.
    pub fn registry(&self) -> &R {
        self.builder.registry()
    }

    /// Options every build runs with.
    pub fn options(&self) -> &BuildOptions {
        self.builder.options()
    }

    /// Resolve the dependency tree of `name` at `version`.
    ///
    /// A package or version the registry does not know yields a leaf, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`DepmapError::EmptyPackageName`] or [`DepmapError::EmptyVersion`]
    /// for empty inputs.
    pub async fn get_dependency_tree(
        &self,
        name: &str,
        version: &str,
    ) -> Result<PackageNode, DepmapError> {
        info!("Building dependency tree for {}:{}", name, version);
        let started = Instant::now();

        let expansion = self.builder.build(name, version).await?;
        let root = expansion.node;

        if expansion.complete {
            if let Some(resolved) = root.version().minimal_version() {
                self.cache().put(root.name(), resolved, root.clone());
            }
        }

        info!(
            "Completed dependency search for {}:{} ({} nodes, {:.2?})",
            name,
            version,
            root.node_count(),
            started.elapsed()
        );
        Ok(root)
    }
}

impl DependencyMapper<RegistryClient> {
    /// Create a mapper that queries the registry named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`.
    pub fn from_config(config: &DepmapConfig, cache: TreeCache) -> Result<Self> {
        let client = RegistryClient::from_config(config)
            .with_context(|| format!("Failed to set up registry client for {}", config.registry_url))?;
        Ok(Self::new(client, cache, BuildOptions::from(config)))
    }
}
