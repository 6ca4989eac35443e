//! Resolve a package and display its dependency tree.
//!
//! # Examples
//!
//! ```bash
//! depmap tree express 4.18.2
//! depmap tree react latest --depth 1
//! depmap tree @types/node ^20.0.0 --format json
//! depmap tree webpack ^5.0.0 --cycle-guard --timeout 30
//! ```
//!
//! # Output Format
//!
//! ## Tree Format (Default)
//! ```text
//! a@1.0.0
//! ├── b@2.1.0 (^2.0.0)
//! │   └── d@1.0.0
//! ├── c@1.0.0
//! │   └── b@2.1.0 (^2.0.0) (*)
//! └── missing@1.0.0 (unresolved)
//!
//! (*) = subtree already shown above
//! ```
//!
//! ## JSON Format
//! The wire format of [`PackageNode`], pretty-printed.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::cache::TreeCache;
use crate::config::DepmapConfig;
use crate::models::PackageNode;
use crate::resolver::DependencyMapper;

/// Command to resolve and display a dependency tree.
#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Package name, e.g. `express` or `@types/node`
    package: String,

    /// Version expression: exact version, range or dist-tag
    version: String,

    /// Output format (tree, json)
    #[arg(short = 'f', long, default_value = "tree")]
    format: String,

    /// Maximum depth to display (unlimited if not specified)
    ///
    /// Only affects output; the full tree is still resolved.
    #[arg(short = 'd', long)]
    depth: Option<usize>,

    /// Stop expanding a package that already appears on its own ancestor path
    #[arg(long)]
    cycle_guard: bool,

    /// Do not resolve packages deeper than this
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Give up on unresolved packages after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl TreeCommand {
    /// Resolve the tree with `config` (after applying this command's flags)
    /// and print it.
    pub async fn execute(self, mut config: DepmapConfig) -> Result<()> {
        self.validate_arguments()?;
        self.apply_overrides(&mut config);
        config.validate()?;

        let mapper = DependencyMapper::from_config(&config, TreeCache::new())?;
        let tree = mapper.get_dependency_tree(&self.package, &self.version).await?;

        match self.format.as_str() {
            "json" => println!("{}", self.render_json(&tree)?),
            _ => print!("{}", self.render_tree(&tree)),
        }
        Ok(())
    }

    fn validate_arguments(&self) -> Result<()> {
        match self.format.as_str() {
            "tree" | "json" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid format '{}'. Valid formats are: tree, json",
                    self.format
                ));
            }
        }

        if self.depth == Some(0) {
            return Err(anyhow::anyhow!("Depth must be at least 1"));
        }
        if self.timeout == Some(0) {
            return Err(anyhow::anyhow!("Timeout must be at least 1 second"));
        }

        Ok(())
    }

    fn apply_overrides(&self, config: &mut DepmapConfig) {
        if self.cycle_guard {
            config.cycle_guard = true;
        }
        if self.max_depth.is_some() {
            config.max_depth = self.max_depth;
        }
        if self.timeout.is_some() {
            config.tree_deadline_secs = self.timeout;
        }
    }

    fn render_tree(&self, root: &PackageNode) -> String {
        let mut out = String::new();
        let mut displayed = HashSet::new();
        let mut has_duplicates = false;

        let _ = writeln!(out, "{}", label(root, false));
        displayed.insert(node_id(root));
        self.render_children(root, "", &mut displayed, &mut has_duplicates, &mut out, 0);

        if has_duplicates {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", "(*) = subtree already shown above".bright_black());
        }
        out
    }

    fn render_children(
        &self,
        node: &PackageNode,
        prefix: &str,
        displayed: &mut HashSet<(String, String)>,
        has_duplicates: &mut bool,
        out: &mut String,
        current_depth: usize,
    ) {
        if let Some(max_depth) = self.depth {
            if current_depth >= max_depth {
                return;
            }
        }

        let children = node.dependencies();
        for (i, child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };

            let id = node_id(child);
            let is_duplicate = !child.is_leaf() && displayed.contains(&id);
            *has_duplicates |= is_duplicate;

            let _ = writeln!(out, "{}{}{}", prefix, connector, label(child, is_duplicate));
            if is_duplicate {
                continue;
            }
            displayed.insert(id);

            let child_prefix =
                if is_last { format!("{prefix}    ") } else { format!("{prefix}│   ") };
            self.render_children(child, &child_prefix, displayed, has_duplicates, out, current_depth + 1);
        }
    }

    fn render_json(&self, root: &PackageNode) -> Result<String> {
        let root = match self.depth {
            Some(depth) => prune(root, depth),
            None => root.clone(),
        };
        Ok(serde_json::to_string_pretty(&root)?)
    }
}

fn node_id(node: &PackageNode) -> (String, String) {
    (node.name().to_string(), node.version().cache_key().to_string())
}

fn label(node: &PackageNode, is_duplicate: bool) -> String {
    let version = node.version();
    let mut label = format!("{}@{}", node.name().cyan(), version.cache_key());
    if let Some(resolved) = version.minimal_version() {
        if resolved != version.original_expression() {
            let _ = write!(label, " {}", format!("({})", version.original_expression()).bright_black());
        }
    } else {
        let _ = write!(label, " {}", "(unresolved)".yellow());
    }
    if is_duplicate {
        let _ = write!(label, " {}", "(*)".bright_black());
    }
    label
}

/// Copy of `node` with everything below `depth` levels dropped.
fn prune(node: &PackageNode, depth: usize) -> PackageNode {
    if depth == 0 {
        return PackageNode::leaf(node.name(), node.version().clone());
    }
    PackageNode::with_dependencies(
        node.name(),
        node.version().clone(),
        node.dependencies().iter().map(|child| prune(child, depth - 1)).collect(),
    )
}
