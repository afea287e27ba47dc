//! Serve command implementation

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::config::Config;
use crate::server::{GraphServer, ServeOptions};

/// Serve the graph over HTTP with live bundle updates
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Graph file to load and watch (starts empty if omitted)
    pub graph: Option<PathBuf>,

    /// Port to listen on [default: server.port from config]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to [default: server.host from config]
    #[arg(long)]
    pub host: Option<String>,

    /// Disable file watching and live updates
    #[arg(long)]
    pub no_live: bool,
}

impl ServeCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Config::load_or_default(config_path)?;

        let options = ServeOptions {
            host: self.host.clone().unwrap_or_else(|| config.server.host.clone()),
            port: self.port.unwrap_or(config.server.port),
            live: config.server.live && !self.no_live,
            graph_path: self.graph.clone(),
        };

        eprintln!(
            "{} Serving at {}\n",
            "→".blue(),
            format!("http://{}:{}", options.host, options.port).cyan().underline()
        );

        if options.live {
            eprintln!(
                "  {} Live updates {}",
                "•".dimmed(),
                "enabled".green()
            );
        }

        eprintln!(
            "  {} Press {} to stop\n",
            "•".dimmed(),
            "Ctrl+C".yellow()
        );

        let server = GraphServer::new(Arc::new(config), options)?;
        server.start().await
    }
}
