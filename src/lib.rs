//! Chunkscope library
//!
//! Code-splitting engine, auto-layout and the tooling around them.

pub mod cli;
pub mod config;
pub mod bundler;
pub mod graph;
pub mod layout;
pub mod server;
pub mod utils;
pub mod watcher;

pub use cli::Cli;
pub use config::Config;
pub use bundler::{compute_chunks, BundleResult, Chunk, ChunkKind};
pub use graph::{DependencyGraph, ImportEdge, ImportKind, ModuleNode};
pub use layout::{layout, LayoutOptions};
