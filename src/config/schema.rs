//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::layout::LayoutOptions;

/// Auto-layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Width of a module box
    #[serde(default = "default_node_width")]
    pub node_width: f64,

    /// Height of a module box
    #[serde(default = "default_node_height")]
    pub node_height: f64,

    /// Horizontal gap between boxes in a layer
    #[serde(default = "default_h_gap")]
    pub h_gap: f64,

    /// Vertical gap between layers
    #[serde(default = "default_v_gap")]
    pub v_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: default_node_width(),
            node_height: default_node_height(),
            h_gap: default_h_gap(),
            v_gap: default_v_gap(),
        }
    }
}

impl From<&LayoutConfig> for LayoutOptions {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            node_width: config.node_width,
            node_height: config.node_height,
            h_gap: config.h_gap,
            v_gap: config.v_gap,
        }
    }
}

fn default_node_width() -> f64 {
    180.0
}

fn default_node_height() -> f64 {
    60.0
}

fn default_h_gap() -> f64 {
    60.0
}

fn default_v_gap() -> f64 {
    80.0
}

fn default_true() -> bool {
    true
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Push bundle results to websocket clients on every change
    #[serde(default = "default_true")]
    pub live: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            live: true,
        }
    }
}

fn default_port() -> u16 {
    4173
}

fn default_host() -> String {
    "localhost".to_string()
}

/// Report output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print bundle results as JSON instead of a colored report
    #[serde(default)]
    pub json: bool,
}
