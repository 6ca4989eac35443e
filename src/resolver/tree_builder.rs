//! Concurrent dependency tree construction.
//!
//! [`TreeBuilder`] expands a root `(name, version expression)` into a
//! [`PackageNode`] tree. Each node is handled the same way:
//!
//! 1. Look the node up in the [`TreeCache`] by its cache key (resolved version
//!    if known, else search token). A hit adopts the cached child list.
//! 2. Otherwise ask the registry for `(name, search token)`. A failed lookup
//!    turns the node into a leaf; the traversal carries on.
//! 3. Record the resolved version and check the cache again, since a
//!    different expression may already have produced this exact version.
//! 4. Spawn one task per declared dependency and wait for all of them.
//! 5. Assemble the node and store it under `(name, resolved version)`.
//!
//! Registry calls are bounded by a semaphore. A permit is only held around
//! the registry request itself, never while a parent waits for its
//! children, so deep trees cannot starve the pool.
//!
//! Three optional guards bound pathological graphs: a per-request deadline,
//! a cycle guard on the ancestor path and a maximum depth. A node cut short
//! by any of them is still returned but is not cached, and neither is any
//! ancestor that contains it.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

use crate::cache::TreeCache;
use crate::config::DepmapConfig;
use crate::core::DepmapError;
use crate::models::PackageNode;
use crate::registry::{Registry, RegistryError, RegistryPackage};
use crate::version::Version;

/// Knobs for a [`TreeBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Maximum number of registry requests in flight
    pub max_concurrency: usize,
    /// Time allowed for one [`TreeBuilder::build`] call
    pub deadline: Option<Duration>,
    /// Turn a package that already appears on its own ancestor path into a leaf
    pub cycle_guard: bool,
    /// Nodes at this depth (root = 0) are not expanded further
    pub max_depth: Option<usize>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from(&DepmapConfig::default())
    }
}

impl From<&DepmapConfig> for BuildOptions {
    fn from(config: &DepmapConfig) -> Self {
        Self {
            max_concurrency: config.effective_max_concurrency(),
            deadline: config.tree_deadline(),
            cycle_guard: config.cycle_guard,
            max_depth: config.max_depth,
        }
    }
}

/// Result of expanding one node.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// The assembled node
    pub node: PackageNode,
    /// `false` when the deadline, cycle guard or depth limit cut this node
    /// or one of its descendants short
    pub complete: bool,
}

impl Expansion {
    fn complete(node: PackageNode) -> Self {
        Self {
            node,
            complete: true,
        }
    }

    fn truncated(node: PackageNode) -> Self {
        Self {
            node,
            complete: false,
        }
    }
}

#[derive(Debug, Error)]
enum LookupFailure {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request pool closed")]
    PoolClosed,
}

/// One `(name, resolved version)` on the path from the root.
#[derive(Debug)]
struct Frame {
    name: String,
    version: String,
    parent: Option<Arc<Frame>>,
}

/// Ancestor path of a node, shared between siblings.
#[derive(Debug, Clone, Default)]
struct Ancestry {
    head: Option<Arc<Frame>>,
    depth: usize,
}

impl Ancestry {
    fn contains(&self, name: &str, version: &str) -> bool {
        let mut frame = self.head.as_deref();
        while let Some(current) = frame {
            if current.name == name && current.version == version {
                return true;
            }
            frame = current.parent.as_deref();
        }
        false
    }

    fn child(&self, name: &str, version: &str) -> Self {
        Self {
            head: Some(Arc::new(Frame {
                name: name.to_string(),
                version: version.to_string(),
                parent: self.head.clone(),
            })),
            depth: self.depth + 1,
        }
    }
}

#[derive(Debug, Clone)]
struct Traversal {
    ancestry: Ancestry,
    deadline: Option<Instant>,
}

impl Traversal {
    fn start(deadline: Option<Duration>) -> Self {
        Self {
            ancestry: Ancestry::default(),
            deadline: deadline.map(|limit| Instant::now() + limit),
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn descend(&self, name: &str, version: &str) -> Self {
        Self {
            ancestry: self.ancestry.child(name, version),
            deadline: self.deadline,
        }
    }
}

struct Shared<R> {
    registry: R,
    cache: TreeCache,
    permits: Semaphore,
    options: BuildOptions,
}

/// Fork-join dependency tree builder.
///
/// Cloning is cheap; clones share the registry, cache and request pool.
pub struct TreeBuilder<R> {
    inner: Arc<Shared<R>>,
}

impl<R> Clone for TreeBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Registry> TreeBuilder<R> {
    /// Create a builder over `registry` that memoizes into `cache`.
    pub fn new(registry: R, cache: TreeCache, options: BuildOptions) -> Self {
        let permits = Semaphore::new(options.max_concurrency.max(1));
        Self {
            inner: Arc::new(Shared {
                registry,
                cache,
                permits,
                options,
            }),
        }
    }

    /// The registry this builder queries.
    pub fn registry(&self) -> &R {
        &self.inner.registry
    }

    /// The cache this builder reads and populates.
    pub fn cache(&self) -> &TreeCache {
        &self.inner.cache
    }

    /// Options in effect.
    pub fn options(&self) -> &BuildOptions {
        &self.inner.options
    }

    /// Build the tree rooted at `name` / `expression`.
    ///
    /// # Errors
    ///
    /// Only input validation fails, before any registry traffic:
    /// [`DepmapError::EmptyPackageName`] or [`DepmapError::EmptyVersion`].
    /// Per-package failures degrade that package to a leaf.
    pub async fn build(&self, name: &str, expression: &str) -> Result<Expansion, DepmapError> {
        if name.is_empty() {
            return Err(DepmapError::EmptyPackageName);
        }
        let version = Version::parse(expression)?;
        let traversal = Traversal::start(self.inner.options.deadline);

        Ok(self.expand(name.to_string(), version, traversal).await)
    }

    fn expand(&self, name: String, version: Version, traversal: Traversal) -> BoxFuture<'static, Expansion> {
        self.clone().expand_node(name, version, traversal).boxed()
    }

    async fn expand_node(self, name: String, version: Version, traversal: Traversal) -> Expansion {
        let cache = &self.inner.cache;
        let options = &self.inner.options;

        if let Some(hit) = cache.get(&name, version.cache_key()) {
            debug!("Cache hit for {}:{}", name, version.cache_key());
            return Expansion::complete(adopt(name, version, &hit));
        }

        if traversal.expired() {
            debug!("Deadline passed before {}:{} was queried", name, version.original_expression());
            return Expansion::truncated(PackageNode::leaf(name, version));
        }

        let lookup = self.lookup(&name, version.search_expression(), traversal.deadline).await;
        let package = match lookup {
            Ok(package) => package,
            Err(failure) => {
                warn!(
                    "Could not query dependencies for {}:{} [{}]: {}",
                    name,
                    version.original_expression(),
                    version.search_expression(),
                    failure
                );
                let complete = !matches!(failure, LookupFailure::DeadlineExceeded);
                return Expansion {
                    node: PackageNode::leaf(name, version),
                    complete,
                };
            }
        };

        let version = version.resolved(package.version);
        let resolved = version.cache_key().to_string();

        if let Some(hit) = cache.get(&name, &resolved) {
            debug!("Cache hit for {}:{} after resolving {}", name, resolved, version.original_expression());
            return Expansion::complete(PackageNode::sharing(name, version, hit.shared_dependencies()));
        }

        if options.cycle_guard && traversal.ancestry.contains(&name, &resolved) {
            debug!("Cycle detected at {}:{}", name, resolved);
            return Expansion::truncated(PackageNode::leaf(name, version));
        }

        if let Some(max_depth) = options.max_depth {
            if traversal.ancestry.depth >= max_depth && !package.dependencies.is_empty() {
                debug!("Depth limit {} reached at {}:{}", max_depth, name, resolved);
                return Expansion::truncated(PackageNode::leaf(name, version));
            }
        }

        let child_traversal = traversal.descend(&name, &resolved);
        let children = package.dependencies.into_iter().map(|(child, expression)| {
            let builder = self.clone();
            let traversal = child_traversal.clone();
            async move { builder.spawn_child(child, expression, traversal).await }
        });
        let expansions = join_all(children).await;

        let complete = expansions.iter().all(|expansion| expansion.complete);
        let node = PackageNode::with_dependencies(
            name,
            version,
            expansions.into_iter().map(|expansion| expansion.node).collect(),
        );

        if complete {
            cache.put(node.name(), &resolved, node.clone());
        }
        Expansion {
            node,
            complete,
        }
    }

    async fn spawn_child(self, name: String, expression: String, traversal: Traversal) -> Expansion {
        let version = match Version::parse(&expression) {
            Ok(version) => version,
            Err(error) => {
                warn!("Skipping dependency {}: {}", name, error);
                return Expansion::complete(PackageNode::leaf(name, Version::unparsed(&expression)));
            }
        };

        let fallback = PackageNode::leaf(name.clone(), version.clone());
        match tokio::spawn(self.expand(name, version, traversal)).await {
            Ok(expansion) => expansion,
            Err(error) => {
                warn!("Expansion of {} did not finish: {}", fallback.name(), error);
                Expansion::truncated(fallback)
            }
        }
    }

    async fn lookup(
        &self,
        name: &str,
        search: &str,
        deadline: Option<Instant>,
    ) -> Result<RegistryPackage, LookupFailure> {
        let fetch = async {
            let _permit =
                self.inner.permits.acquire().await.map_err(|_| LookupFailure::PoolClosed)?;
            debug!("Fetching {}:{}", name, search);
            Ok::<_, LookupFailure>(self.inner.registry.fetch(name, search).await?)
        };

        match deadline {
            Some(deadline) => {
                timeout_at(deadline, fetch).await.map_err(|_| LookupFailure::DeadlineExceeded)?
            }
            None => fetch.await,
        }
    }
}

/// Reuse a cached subtree for a node reached through `version`'s expression.
fn adopt(name: String, version: Version, hit: &PackageNode) -> PackageNode {
    let version = match hit.version().minimal_version() {
        Some(resolved) => version.resolved(resolved),
        None => version,
    };
    PackageNode::sharing(name, version, hit.shared_dependencies())
}
