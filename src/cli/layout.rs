//! Layout command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use super::load_graph;
use crate::config::Config;
use crate::layout::layout_graph;

/// Compute layered display positions for a graph
#[derive(Args, Debug)]
pub struct LayoutCommand {
    /// Graph file (.json or .toml)
    pub graph: PathBuf,

    /// Write the positioned graph here instead of stdout (may equal the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl LayoutCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Config::load_or_default(config_path)?;

        let graph = load_graph(&self.graph)?;
        let laid_out = layout_graph(&graph, &config.layout_options());

        match &self.output {
            Some(path) => {
                laid_out
                    .save(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!(
                    "{} Laid out {} module(s) into {}\n",
                    "✓".green().bold(),
                    laid_out.len(),
                    path.display().to_string().cyan()
                );
            }
            None => println!("{}", serde_json::to_string_pretty(&laid_out)?),
        }

        Ok(())
    }
}
