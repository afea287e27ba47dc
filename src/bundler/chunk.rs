//! Chunk types produced by code splitting

use serde::{Deserialize, Serialize};

use crate::graph::ModuleId;

/// Display colors cycled through by chunk id
pub const CHUNK_COLORS: [&str; 8] = [
    "#3b82f6", // blue
    "#10b981", // emerald
    "#f97316", // orange
    "#ef4444", // red
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#06b6d4", // cyan
    "#84cc16", // lime
];

/// Color for a chunk id
pub fn chunk_color(id: usize) -> &'static str {
    CHUNK_COLORS[id % CHUNK_COLORS.len()]
}

/// Type of chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Entry point chunk - loaded immediately
    Main,
    /// Async chunk - loaded on demand via dynamic import
    Async,
    /// Shared chunk - contains modules used by multiple chunks
    Shared,
}

impl ChunkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Main => "main",
            ChunkKind::Async => "async",
            ChunkKind::Shared => "shared",
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chunk is a group of modules that will be bundled together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Creation-order id, also selects the color
    pub id: usize,

    /// Type of chunk
    pub kind: ChunkKind,

    /// Module IDs included in this chunk
    pub modules: Vec<ModuleId>,

    pub color: String,

    /// Why the bundler created this chunk
    pub reason: String,
}

impl Chunk {
    fn new(id: usize, kind: ChunkKind, modules: Vec<ModuleId>, reason: String) -> Self {
        Self {
            id,
            kind,
            modules,
            color: chunk_color(id).to_string(),
            reason,
        }
    }

    /// Create the main chunk
    pub fn main(id: usize, modules: Vec<ModuleId>) -> Self {
        Self::new(
            id,
            ChunkKind::Main,
            modules,
            "Entry point and its static dependencies form the main bundle.".to_string(),
        )
    }

    /// Create an async chunk rooted at a dynamically imported module
    pub fn async_chunk(id: usize, modules: Vec<ModuleId>, target_name: &str) -> Self {
        Self::new(
            id,
            ChunkKind::Async,
            modules,
            format!(
                "\"{}\" is loaded with a dynamic import(), so it becomes a separate async chunk \
                 that is only downloaded when needed.",
                target_name
            ),
        )
    }

    /// Create the shared chunk; `names` are display names of its modules
    pub fn shared(id: usize, modules: Vec<ModuleId>, names: &[String]) -> Self {
        let (verb, pronoun) = if modules.len() == 1 {
            ("is", "it")
        } else {
            ("are", "them")
        };

        Self::new(
            id,
            ChunkKind::Shared,
            modules,
            format!(
                "{} {} imported by multiple chunks, so the bundler extracts {} into a shared \
                 chunk to avoid duplication.",
                names.join(", "),
                verb,
                pronoun
            ),
        )
    }

    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of modules in chunk
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.iter().any(|m| m == id)
    }
}
