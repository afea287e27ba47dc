//! Configuration handling for Chunkscope
//!
//! Parses and manages chunkscope.toml configuration files.

mod schema;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layout::LayoutOptions;

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Auto-layout settings
    #[serde(default)]
    pub layout: LayoutConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        let values = [layout.node_width, layout.node_height, layout.h_gap, layout.v_gap];
        if values.iter().any(|value| !value.is_finite()) {
            anyhow::bail!("layout sizes must be finite numbers");
        }

        if layout.node_width <= 0.0 || layout.node_height <= 0.0 {
            anyhow::bail!(
                "layout.node_width and layout.node_height must be positive (got {} x {})",
                layout.node_width,
                layout.node_height
            );
        }

        if layout.h_gap < 0.0 || layout.v_gap < 0.0 {
            anyhow::bail!("layout gaps must not be negative");
        }

        Ok(())
    }

    /// Layout options for the layout engine
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions::from(&self.layout)
    }

    /// Render the configuration as TOML, as written by `init`
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
