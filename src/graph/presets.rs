//! Built-in example graphs, each demonstrating one code-splitting behaviour

use serde::Serialize;

use super::{DependencyGraph, ImportEdge, ImportKind, ModuleNode};

/// A ready-made graph with an explanation of what it teaches
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    /// Short identifier used on the command line and in URLs
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub learning_point: &'static str,
    #[serde(skip)]
    build: fn() -> DependencyGraph,
}

impl Preset {
    /// Materialize the preset's graph (positions are not laid out)
    pub fn graph(&self) -> DependencyGraph {
        (self.build)()
    }
}

/// All presets in display order
pub fn all() -> Vec<Preset> {
    vec![
        Preset {
            slug: "basic",
            name: "Basic App (Single Chunk)",
            description: "All static imports — everything ends up in one chunk.",
            learning_point: "When every import is a regular static import, the bundler puts all \
                modules into a single output file. This is the simplest case.",
            build: basic,
        },
        Preset {
            slug: "lazy-routes",
            name: "Lazy-Loaded Routes",
            description: "Dynamic imports for Dashboard and Settings create separate async chunks.",
            learning_point: "Dynamic import() tells the bundler to split code at that boundary. \
                Each dynamically imported module becomes its own async chunk, loaded only when \
                the user navigates to that route.",
            build: lazy_routes,
        },
        Preset {
            slug: "shared-vendor",
            name: "Shared Vendor Code",
            description: "utils.ts is used by multiple chunks, so it gets extracted into a shared chunk.",
            learning_point: "When a module is imported by two or more chunks, the bundler extracts \
                it into a shared chunk. This prevents the same code from being downloaded twice.",
            build: shared_vendor,
        },
    ]
}

/// Look up a preset by slug
pub fn find(slug: &str) -> Option<Preset> {
    all().into_iter().find(|p| p.slug == slug)
}

fn edge(source: &str, target: &str, kind: ImportKind) -> ImportEdge {
    ImportEdge::new(format!("{}-{}", source, target), source, target, kind)
}

fn basic() -> DependencyGraph {
    DependencyGraph::from_parts(
        vec![
            ModuleNode::new("app", "App.tsx").entry(),
            ModuleNode::new("header", "Header.tsx"),
            ModuleNode::new("footer", "Footer.tsx"),
            ModuleNode::new("utils", "utils.ts"),
        ],
        vec![
            edge("app", "header", ImportKind::Static),
            edge("app", "footer", ImportKind::Static),
            edge("header", "utils", ImportKind::Static),
        ],
    )
}

fn lazy_routes() -> DependencyGraph {
    DependencyGraph::from_parts(
        vec![
            ModuleNode::new("app", "App.tsx").entry(),
            ModuleNode::new("nav", "Nav.tsx"),
            ModuleNode::new("dashboard", "Dashboard.tsx"),
            ModuleNode::new("chart", "Chart.tsx"),
            ModuleNode::new("settings", "Settings.tsx"),
        ],
        vec![
            edge("app", "nav", ImportKind::Static),
            edge("app", "dashboard", ImportKind::Dynamic),
            edge("app", "settings", ImportKind::Dynamic),
            edge("dashboard", "chart", ImportKind::Static),
        ],
    )
}

fn shared_vendor() -> DependencyGraph {
    DependencyGraph::from_parts(
        vec![
            ModuleNode::new("app", "App.tsx").entry(),
            ModuleNode::new("home", "Home.tsx"),
            ModuleNode::new("profile", "Profile.tsx"),
            ModuleNode::new("utils", "utils.ts"),
            ModuleNode::new("api", "api.ts"),
        ],
        vec![
            edge("app", "home", ImportKind::Static),
            edge("app", "profile", ImportKind::Dynamic),
            edge("home", "utils", ImportKind::Static),
            edge("profile", "utils", ImportKind::Static),
            edge("profile", "api", ImportKind::Static),
        ],
    )
}
