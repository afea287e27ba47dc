//! Module graph data structures
//!
//! The shared vocabulary of the chunking and layout engines: modules, import
//! edges and the graph document that holds them. Also home to graph file
//! loading and the editing operations a front-end performs on a graph.

pub mod presets;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Unique identifier for a module
pub type ModuleId = String;

/// How a module is imported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    /// `import x from './x'` - pulled into the importer's chunk
    #[default]
    Static,
    /// `import('./x')` - splits off a chunk loaded on demand
    Dynamic,
}

impl ImportKind {
    /// Parse an import kind. Anything other than `dynamic` is static.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("dynamic") {
            ImportKind::Dynamic
        } else {
            ImportKind::Static
        }
    }

    /// The other kind
    pub fn toggled(self) -> Self {
        match self {
            ImportKind::Static => ImportKind::Dynamic,
            ImportKind::Dynamic => ImportKind::Static,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Static => "static",
            ImportKind::Dynamic => "dynamic",
        }
    }
}

impl<'de> Deserialize<'de> for ImportKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(ImportKind::parse).unwrap_or_default())
    }
}

/// Display position of a module
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A module in the dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Stable, caller-assigned identifier
    pub id: ModuleId,

    /// Display name, usually a file name
    #[serde(alias = "filename")]
    pub name: String,

    /// Whether this is the entry point
    #[serde(default, rename = "entry", alias = "isEntry")]
    pub is_entry: bool,

    /// Where a front-end draws the module
    #[serde(default)]
    pub position: Position,
}

impl ModuleNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_entry: false,
            position: Position::default(),
        }
    }

    /// Builder-style entry flag
    pub fn entry(mut self) -> Self {
        self.is_entry = true;
        self
    }
}

/// A directed import relation `source -> target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub id: String,
    pub source: ModuleId,
    pub target: ModuleId,
    #[serde(default, alias = "importType")]
    pub kind: ImportKind,
}

impl ImportEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: ImportKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == ImportKind::Dynamic
    }
}

/// Errors raised while reading or writing graph files
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to access graph file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON graph {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML graph {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize graph as TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("unsupported graph file format '{extension}' (expected .json or .toml)")]
    UnsupportedFormat { extension: String },
}

/// On-disk graph formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Toml,
}

impl GraphFormat {
    /// Determine the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, GraphError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "json" => Ok(GraphFormat::Json),
            "toml" => Ok(GraphFormat::Toml),
            _ => Err(GraphError::UnsupportedFormat { extension: ext }),
        }
    }
}

/// Something odd about a graph. The engines tolerate all of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GraphDiagnostic {
    /// Nothing can be bundled
    NoEntry,
    /// Only the first entry is used
    MultipleEntries { ids: Vec<ModuleId> },
    /// Edge endpoint that is not a module; the edge is ignored
    DanglingEdge { edge: String, missing: ModuleId },
    /// Module id used more than once
    DuplicateModuleId { id: ModuleId },
}

impl std::fmt::Display for GraphDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphDiagnostic::NoEntry => {
                write!(f, "no entry module; every module is unreachable")
            }
            GraphDiagnostic::MultipleEntries { ids } => write!(
                f,
                "{} entry modules ({}); only '{}' is used",
                ids.len(),
                ids.join(", "),
                ids.first().map(String::as_str).unwrap_or("")
            ),
            GraphDiagnostic::DanglingEdge { edge, missing } => {
                write!(f, "edge '{}' references unknown module '{}'", edge, missing)
            }
            GraphDiagnostic::DuplicateModuleId { id } => {
                write!(f, "module id '{}' is used more than once", id)
            }
        }
    }
}

/// The module dependency graph as a caller-owned snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub modules: Vec<ModuleNode>,

    #[serde(default)]
    pub edges: Vec<ImportEdge>,
}

impl DependencyGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(modules: Vec<ModuleNode>, edges: Vec<ImportEdge>) -> Self {
        Self { modules, edges }
    }

    /// Load a graph from a `.json` or `.toml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let format = GraphFormat::from_path(path)?;

        let content = fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, format, path)
    }

    /// Parse graph text; `path` is only used for error messages
    pub fn parse(content: &str, format: GraphFormat, path: &Path) -> Result<Self, GraphError> {
        match format {
            GraphFormat::Json => serde_json::from_str(content).map_err(|source| GraphError::Json {
                path: path.to_path_buf(),
                source,
            }),
            GraphFormat::Toml => toml::from_str(content).map_err(|source| GraphError::Toml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the graph, choosing the format from the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        let path = path.as_ref();
        let content = match GraphFormat::from_path(path)? {
            GraphFormat::Json => serde_json::to_string_pretty(self).map_err(|source| {
                GraphError::Json {
                    path: path.to_path_buf(),
                    source,
                }
            })?,
            GraphFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get a module by ID
    pub fn module(&self, id: &str) -> Option<&ModuleNode> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Get an edge by ID
    pub fn edge(&self, id: &str) -> Option<&ImportEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// First module flagged as entry
    pub fn entry(&self) -> Option<&ModuleNode> {
        self.modules.iter().find(|m| m.is_entry)
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Add a module with a generated `module-<n>` id and return the id.
    ///
    /// The first module added to an empty graph becomes the entry.
    pub fn add_module(&mut self, name: Option<String>, position: Position) -> ModuleId {
        let mut n = self.modules.len() + 1;
        while self.module(&format!("module-{}", n)).is_some() {
            n += 1;
        }

        let id = format!("module-{}", n);
        self.modules.push(ModuleNode {
            id: id.clone(),
            name: name.unwrap_or_else(|| format!("file{}.ts", n)),
            is_entry: self.modules.is_empty(),
            position,
        });

        id
    }

    /// Remove a module and every edge touching it
    pub fn remove_module(&mut self, id: &str) -> bool {
        let before = self.modules.len();
        self.modules.retain(|m| m.id != id);
        if self.modules.len() == before {
            return false;
        }

        self.edges.retain(|e| e.source != id && e.target != id);
        true
    }

    pub fn rename_module(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.modules.iter_mut().find(|m| m.id == id) {
            Some(module) => {
                module.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Make `id` the one and only entry point
    pub fn set_entry(&mut self, id: &str) -> bool {
        if self.module(id).is_none() {
            return false;
        }

        for module in &mut self.modules {
            module.is_entry = module.id == id;
        }
        true
    }

    /// Add a static import edge and return its id
    pub fn connect(&mut self, source: &str, target: &str) -> String {
        let base = format!("e-{}-{}", source, target);
        let mut suffix = 0;
        let mut id = format!("{}-{}", base, suffix);
        while self.edge(&id).is_some() {
            suffix += 1;
            id = format!("{}-{}", base, suffix);
        }

        self.edges
            .push(ImportEdge::new(id.clone(), source, target, ImportKind::Static));
        id
    }

    /// Flip an edge between static and dynamic
    pub fn toggle_import_kind(&mut self, edge_id: &str) -> bool {
        match self.edges.iter_mut().find(|e| e.id == edge_id) {
            Some(edge) => {
                edge.kind = edge.kind.toggled();
                true
            }
            None => false,
        }
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != edge_id);
        self.edges.len() != before
    }

    pub fn clear(&mut self) {
        self.modules.clear();
        self.edges.clear();
    }

    /// Report entry ambiguity, dangling edges and duplicate ids
    pub fn diagnostics(&self) -> Vec<GraphDiagnostic> {
        let mut diagnostics = Vec::new();

        let entries: Vec<ModuleId> = self
            .modules
            .iter()
            .filter(|m| m.is_entry)
            .map(|m| m.id.clone())
            .collect();
        match entries.len() {
            0 if !self.modules.is_empty() => diagnostics.push(GraphDiagnostic::NoEntry),
            0 | 1 => {}
            _ => diagnostics.push(GraphDiagnostic::MultipleEntries { ids: entries }),
        }

        let mut ids = HashSet::new();
        let mut reported = HashSet::new();
        for module in &self.modules {
            if !ids.insert(module.id.as_str()) && reported.insert(module.id.as_str()) {
                diagnostics.push(GraphDiagnostic::DuplicateModuleId {
                    id: module.id.clone(),
                });
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    diagnostics.push(GraphDiagnostic::DanglingEdge {
                        edge: edge.id.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        diagnostics
    }
}
