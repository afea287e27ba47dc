//! Command-line interface for Chunkscope
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `bundle`: Split a graph into chunks and report them
//! - `layout`: Compute display positions for a graph
//! - `watch`: Re-bundle whenever a graph file changes
//! - `serve`: HTTP API with live updates
//! - `init`: Write a starter graph and config
//! - `presets`: List the built-in example graphs

mod bundle;
mod init;
mod layout;
mod presets;
mod report;
mod serve;
mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::warn;

use crate::graph::DependencyGraph;

pub use bundle::BundleCommand;
pub use init::InitCommand;
pub use layout::LayoutCommand;
pub use presets::PresetsCommand;
pub use serve::ServeCommand;
pub use watch::WatchCommand;

/// Chunkscope - see how a bundler splits your module graph into chunks
#[derive(Parser, Debug)]
#[command(name = "chunkscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to chunkscope.toml config file
    #[arg(short, long, global = true, default_value = "chunkscope.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a module graph into chunks
    Bundle(BundleCommand),

    /// Compute layered display positions for a graph
    Layout(LayoutCommand),

    /// Re-run the bundler whenever the graph file changes
    Watch(WatchCommand),

    /// Serve the graph over HTTP with live bundle updates
    Serve(ServeCommand),

    /// Write a starter graph and config
    Init(InitCommand),

    /// List the built-in example graphs
    Presets(PresetsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Bundle(cmd) => cmd.execute(&self.config).await,
            Commands::Layout(cmd) => cmd.execute(&self.config).await,
            Commands::Watch(cmd) => cmd.execute(&self.config).await,
            Commands::Serve(cmd) => cmd.execute(&self.config).await,
            Commands::Init(cmd) => cmd.execute().await,
            Commands::Presets(cmd) => cmd.execute().await,
        }
    }
}

/// Print the Chunkscope banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "◆".cyan(),
        "Chunkscope".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

/// Load a graph file and log anything suspicious about it
fn load_graph(path: &Path) -> Result<DependencyGraph> {
    let graph = DependencyGraph::load(path)
        .with_context(|| format!("Failed to load graph {}", path.display()))?;

    for diagnostic in graph.diagnostics() {
        warn!("{}", diagnostic);
    }

    Ok(graph)
}
