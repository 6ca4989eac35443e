//! Dependency tree data model.
//!
//! A [`PackageNode`] is one vertex of a resolved dependency tree. Nodes are
//! built bottom-up by the tree builder and never change afterwards: the child
//! list is an `Arc<[PackageNode]>` that the tree cache and every parent linking
//! the same `(name, resolved version)` share. The dependency edges therefore
//! form a directed graph that is consumed and rendered as a tree.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "name": "a",
//!   "version": { "originalExpression": "1.0.0", "minimalVersion": "1.0.0" },
//!   "dependencies": [
//!     {
//!       "name": "b",
//!       "version": { "originalExpression": "^2.0.0", "minimalVersion": "2.1.0" },
//!       "dependencies": []
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::version::Version;

/// One package in a dependency tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageNode {
    name: String,
    version: Version,
    #[serde(default = "no_dependencies")]
    dependencies: Arc<[PackageNode]>,
}

fn no_dependencies() -> Arc<[PackageNode]> {
    Arc::from(Vec::new())
}

impl PackageNode {
    /// A node without dependencies.
    pub fn leaf(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies: no_dependencies(),
        }
    }

    /// A node with the given children.
    ///
    /// Children are ordered by name (then resolved version) so rendering is
    /// stable; the order carries no meaning.
    pub fn with_dependencies(
        name: impl Into<String>,
        version: Version,
        mut dependencies: Vec<PackageNode>,
    ) -> Self {
        dependencies.sort_by(|a, b| {
            a.name.cmp(&b.name).then_with(|| a.version.cache_key().cmp(b.version.cache_key()))
        });
        Self {
            name: name.into(),
            version,
            dependencies: Arc::from(dependencies),
        }
    }

    /// A node for `name@version` that reuses an already-built child list.
    pub fn sharing(
        name: impl Into<String>,
        version: Version,
        dependencies: Arc<[PackageNode]>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies,
        }
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version expression and resolution.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Direct dependencies.
    pub fn dependencies(&self) -> &[PackageNode] {
        &self.dependencies
    }

    /// Shared handle to the child list.
    pub fn shared_dependencies(&self) -> Arc<[PackageNode]> {
        Arc::clone(&self.dependencies)
    }

    /// Whether the node has no dependencies.
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Look up a direct dependency by name.
    pub fn dependency(&self, name: &str) -> Option<&PackageNode> {
        self.dependencies.iter().find(|dep| dep.name == name)
    }

    /// Number of nodes in the rendered tree, including this one.
    ///
    /// Shared subtrees are counted once per occurrence.
    pub fn node_count(&self) -> usize {
        1 + self.dependencies.iter().map(PackageNode::node_count).sum::<usize>()
    }

    /// Depth of the rendered tree; a leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.dependencies.iter().map(|dep| dep.depth() + 1).max().unwrap_or(0)
    }

    /// Distinct `(name, resolved version)` pairs in the tree.
    ///
    /// Unresolved nodes contribute their original expression instead.
    pub fn distinct_packages(&self) -> HashSet<(String, String)> {
        let mut seen = HashSet::new();
        self.collect_distinct(&mut seen);
        seen
    }

    fn collect_distinct(&self, seen: &mut HashSet<(String, String)>) {
        let version = self
            .version
            .minimal_version()
            .unwrap_or(self.version.original_expression())
            .to_string();
        if seen.insert((self.name.clone(), version)) {
            for dep in self.dependencies.iter() {
                dep.collect_distinct(seen);
            }
        }
    }
}

/// Structural equality: same name, same version, and equal dependency sets.
///
/// Sibling order is ignored.
impl PartialEq for PackageNode {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name
            || self.version != other.version
            || self.dependencies.len() != other.dependencies.len()
        {
            return false;
        }
        let mut unmatched: Vec<&PackageNode> = other.dependencies.iter().collect();
        self.dependencies.iter().all(|dep| {
            match unmatched.iter().position(|candidate| *candidate == dep) {
                Some(index) => {
                    unmatched.swap_remove(index);
                    true
                }
                None => false,
            }
        })
    }
}

impl Eq for PackageNode {}
