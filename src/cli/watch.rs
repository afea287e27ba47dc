//! Watch command implementation

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::{debug, info, warn};

use super::{load_graph, report};
use crate::bundler::{bundle_graph, BundleResult};
use crate::config::Config;
use crate::graph::DependencyGraph;
use crate::utils::fingerprint;
use crate::watcher::watch_file;

/// Re-run the bundler whenever the graph file changes
#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Graph file (.json or .toml)
    pub graph: PathBuf,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl WatchCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Config::load_or_default(config_path)?;
        let json = self.json || config.output.json;

        let graph = load_graph(&self.graph)?;
        let result = bundle_graph(&graph);
        print_result(&graph, &result, json)?;
        let mut last = fingerprint(&result)?;

        watch_file(&self.graph, move |path| {
            if let Some(next) = rebundle(path, &last, json) {
                last = next;
            }
        })?;

        eprintln!(
            "{} Watching {} for changes. Press {} to stop\n",
            "→".blue(),
            self.graph.display().to_string().cyan(),
            "Ctrl+C".yellow()
        );

        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

/// Reload and re-bundle; returns the new fingerprint if the result changed
fn rebundle(path: &Path, last: &str, json: bool) -> Option<String> {
    let graph = match load_graph(path) {
        Ok(graph) => graph,
        Err(e) => {
            warn!("{:#}", e);
            return None;
        }
    };

    let result = bundle_graph(&graph);
    let next = fingerprint(&result).ok()?;
    if next == last {
        debug!("Bundle result unchanged");
        return None;
    }

    eprintln!(
        "  {} Graph changed: {}\n",
        "↻".yellow(),
        path.display().to_string().dimmed()
    );
    if let Err(e) = print_result(&graph, &result, json) {
        warn!("Failed to print result: {}", e);
    }

    Some(next)
}

fn print_result(graph: &DependencyGraph, result: &BundleResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
    } else {
        report::print_bundle(graph, result);
    }
    Ok(())
}
