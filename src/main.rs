//! depmap CLI entry point
//!
//! Parses arguments, runs the command and renders errors:
//! - `tree` - resolve and print the dependency tree of a package
//! - `serve` - serve dependency trees over HTTP

use anyhow::Result;
use clap::Parser;
use depmap_cli::cli;
use depmap_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
