//! Bundle command implementation

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use super::{load_graph, report};
use crate::bundler::bundle_graph;
use crate::config::Config;
use crate::utils::format_duration;

/// Split a module graph into chunks
#[derive(Args, Debug)]
pub struct BundleCommand {
    /// Graph file (.json or .toml)
    pub graph: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl BundleCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Config::load_or_default(config_path)?;

        let graph = load_graph(&self.graph)?;

        let start = Instant::now();
        let result = bundle_graph(&graph);
        let duration = start.elapsed();

        if self.json || config.output.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        report::print_bundle(&graph, &result);

        eprintln!(
            "{} Split {} module(s) into {} chunk(s) in {}\n",
            "✓".green().bold(),
            graph.len(),
            result.chunks.len(),
            format_duration(duration)
        );

        Ok(())
    }
}
