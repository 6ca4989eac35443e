//! Run the dependency tree HTTP server.
//!
//! ```bash
//! depmap serve                        # listen on bind_address from the config
//! depmap serve --bind 0.0.0.0:8080
//! curl http://127.0.0.1:8080/registry/express/4.18.2
//! ```

use anyhow::Result;
use clap::Args;
use std::sync::Arc;

use crate::cache::TreeCache;
use crate::config::DepmapConfig;
use crate::resolver::DependencyMapper;
use crate::server;

/// Command to serve dependency trees over HTTP.
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on, overriding `bind_address` from the config
    #[arg(short = 'b', long, value_name = "ADDR")]
    bind: Option<String>,
}

impl ServeCommand {
    /// Serve until Ctrl-C. All requests share one tree cache.
    pub async fn execute(self, mut config: DepmapConfig) -> Result<()> {
        self.apply_overrides(&mut config);
        config.validate()?;

        let mapper = Arc::new(DependencyMapper::from_config(&config, TreeCache::new())?);
        server::run(&config, mapper).await
    }

    fn apply_overrides(&self, config: &mut DepmapConfig) {
        if let Some(bind) = &self.bind {
            config.bind_address.clone_from(bind);
        }
    }
}
