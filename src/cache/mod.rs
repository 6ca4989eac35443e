//! Concurrent memoization of resolved subtrees.
//!
//! [`TreeCache`] maps `(package name, resolved version)` to the [`PackageNode`]
//! built for it. The tree builder consults it before every registry lookup and
//! stores each node once its children are joined, so a package that appears in
//! many places of a graph is expanded once.
//!
//! # Concurrency
//!
//! - **DashMap sharded access**: readers and writers from many traversal
//!   branches never block each other on a single global lock
//! - **Last writer wins**: two branches that race on the same key both build
//!   equivalent nodes, so overwriting is harmless
//! - **Cheap clones**: the cache is an `Arc` handle; clones share storage
//!
//! # Lifetime
//!
//! Entries live as long as the cache. There is no eviction,
//! so a long-running server keeps every tree it has resolved.

use dashmap::DashMap;
use std::sync::Arc;

use crate::models::PackageNode;

/// Thread-safe `(name, version) → PackageNode` store.
#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    entries: Arc<DashMap<(String, String), PackageNode>>,
}

impl TreeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the subtree cached for `name@version`.
    ///
    /// `version` is a resolved version string (or a search token that is itself
    /// a concrete version).
    pub fn get(&self, name: &str, version: &str) -> Option<PackageNode> {
        self.entries
            .get(&(name.to_string(), version.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Store the subtree for `name@version`, replacing any previous entry.
    pub fn put(&self, name: &str, version: &str, node: PackageNode) {
        self.entries.insert((name.to_string(), version.to_string()), node);
    }

    /// Whether `name@version` is cached.
    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.entries.contains_key(&(name.to_string(), version.to_string()))
    }

    /// Number of cached subtrees.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached subtree.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Snapshot of the cached keys, formatted as `name@version` and sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .map(|entry| {
                let (name, version) = entry.key();
                format!("{name}@{version}")
            })
            .collect();
        keys.sort();
        keys
    }
}
