//! Presets command implementation

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::graph::presets;

/// List the built-in example graphs
#[derive(Args, Debug)]
pub struct PresetsCommand {}

impl PresetsCommand {
    pub async fn execute(&self) -> Result<()> {
        for preset in presets::all() {
            println!("{} {}", preset.slug.cyan().bold(), preset.name.dimmed());
            println!("  {}", preset.description);
            println!("  {}\n", preset.learning_point.dimmed());
        }

        println!(
            "Create one with {}",
            "chunkscope init --preset <slug>".yellow()
        );

        Ok(())
    }
}
