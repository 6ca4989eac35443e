//! Command-line interface for depmap.
//!
//! # Commands
//!
//! - `tree` - resolve and print the dependency tree of one package
//! - `serve` - run the HTTP server
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - errors only
//! - `--config` / `-c` - path to a config file (default `~/.depmap/config.toml`)
//! - `--registry` - registry base URL, overriding the config file
//!
//! Logs go to stderr so that `depmap tree --format json` output can be piped.
//! `RUST_LOG` takes precedence over `--verbose` and `--quiet`.
//!
//! # Examples
//!
//! ```bash
//! depmap tree express ^4.18.0
//! depmap tree react latest --format json --depth 2
//! depmap --registry http://localhost:4873 serve --bind 0.0.0.0:8080
//! ```

mod serve;
mod tree;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{DepmapConfig, expand_config_path};

/// Main CLI application structure for depmap.
#[derive(Parser, Debug)]
#[command(
    name = "depmap",
    about = "Resolve the full transitive dependency tree of an npm package",
    version,
    author,
    long_about = "depmap queries an npm-compatible registry recursively and prints the \
                  dependency tree of a package, or serves trees over HTTP."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    ///
    /// Shows cache hits and every registry query. Equivalent to
    /// `RUST_LOG=debug`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file.
    ///
    /// `~` and environment variables are expanded. The file must exist when
    /// given explicitly.
    ///
    /// ```bash
    /// depmap --config ./dev-config.toml tree lodash 4.17.21
    /// depmap -c ~/.depmap/mirror.toml serve
    /// ```
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Registry base URL, overriding `registry_url` from the config file.
    #[arg(long, global = true, value_name = "URL")]
    registry: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a package and print its dependency tree.
    ///
    /// See [`tree::TreeCommand`] for options.
    Tree(tree::TreeCommand),

    /// Serve dependency trees over HTTP.
    ///
    /// See [`serve::ServeCommand`] for options.
    Serve(serve::ServeCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// Initializes logging, loads the configuration and dispatches to the
    /// subcommand.
    ///
    /// # Errors
    ///
    /// Returns any error from configuration loading or the subcommand.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_level());
        let config = self.load_config().await?;

        match self.command {
            Commands::Tree(cmd) => cmd.execute(config).await,
            Commands::Serve(cmd) => cmd.execute(config).await,
        }
    }

    /// Default log filter implied by `--verbose` / `--quiet`.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    async fn load_config(&self) -> Result<DepmapConfig> {
        let path = self.config.as_deref().map(expand_config_path);
        let mut config = DepmapConfig::load_with_optional(path).await?;
        if let Some(registry) = &self.registry {
            config.registry_url.clone_from(registry);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_level`. Calling this twice is harmless.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
