//! Project initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::graph::presets;
use crate::layout::layout_graph;

/// Write a starter graph and config
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Directory to initialize
    #[arg(default_value = ".")]
    pub dir: String,

    /// Preset to start from (see `chunkscope presets`)
    #[arg(short, long, default_value = "shared-vendor")]
    pub preset: String,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let dir = Path::new(&self.dir);

        let preset = presets::find(&self.preset).with_context(|| {
            let slugs: Vec<&str> = presets::all().iter().map(|p| p.slug).collect();
            format!(
                "Unknown preset '{}' (available: {})",
                self.preset,
                slugs.join(", ")
            )
        })?;

        eprintln!(
            "{} Initializing from {} preset...\n",
            "→".blue(),
            preset.name.cyan()
        );

        fs::create_dir_all(dir).context("Failed to create directory")?;

        let config = Config::default();

        let graph_path = dir.join("graph.json");
        if self.should_write(&graph_path) {
            let graph = layout_graph(&preset.graph(), &config.layout_options());
            graph
                .save(&graph_path)
                .context("Failed to write graph.json")?;
            eprintln!("  {} Created {}", "✓".green(), "graph.json".cyan());
        }

        let config_path = dir.join("chunkscope.toml");
        if self.should_write(&config_path) {
            fs::write(&config_path, config.to_toml()?)
                .context("Failed to write chunkscope.toml")?;
            eprintln!("  {} Created {}", "✓".green(), "chunkscope.toml".cyan());
        }

        eprintln!("\n  {}\n", preset.learning_point.dimmed());
        eprintln!("  Next steps:");
        if self.dir != "." {
            eprintln!("    {} cd {}", "→".dimmed(), self.dir.cyan());
        }
        eprintln!("    {} chunkscope bundle graph.json", "→".dimmed());
        eprintln!();

        Ok(())
    }

    /// Skip existing files unless `--force` is given
    fn should_write(&self, path: &Path) -> bool {
        if path.exists() && !self.force {
            eprintln!(
                "  {} Skipped {} (exists, use --force to overwrite)",
                "•".dimmed(),
                path.display().to_string().yellow()
            );
            return false;
        }
        true
    }
}
