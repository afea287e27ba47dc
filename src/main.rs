//! Chunkscope - see how a bundler splits your module graph into chunks
//!
//! Feed it a graph of modules connected by static and dynamic imports and it
//! shows the chunks a code-splitting bundler would emit.
//!
//! # Features
//! - Main, async and shared chunk computation with explanations
//! - Unreachable module detection
//! - Layered auto-layout for drawing the graph
//! - Watch mode and an HTTP API with live WebSocket updates

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chunkscope_lib::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("chunkscope=debug,chunkscope_lib=debug,tower_http=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("chunkscope=info,chunkscope_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
