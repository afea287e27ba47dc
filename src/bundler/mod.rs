//! Core chunking engine
//!
//! Splits a module graph into output chunks the way a bundler with dynamic
//! `import()` support does:
//!
//! 1. The entry module and everything it reaches through static imports form
//!    the main chunk.
//! 2. Every dynamic import target starts an async chunk made of its own static
//!    closure. Async chunks may dynamically import further chunks.
//! 3. Modules that ended up in two or more chunks are moved into a single
//!    shared chunk.
//! 4. Modules never reached are reported as unreachable.
//!
//! The engine is a pure function of its inputs; it never mutates them and
//! keeps no state between calls.

mod chunk;

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{DependencyGraph, ImportEdge, ImportKind, ModuleId, ModuleNode};

pub use chunk::{chunk_color, Chunk, ChunkKind, CHUNK_COLORS};

/// Result of splitting a graph into chunks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResult {
    /// Non-empty chunks in id order
    pub chunks: Vec<Chunk>,

    /// Modules not reachable from the entry, in input order
    pub unreachable_modules: Vec<ModuleId>,
}

impl BundleResult {
    /// The chunk that contains a module
    pub fn chunk_of(&self, module_id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.contains(module_id))
    }

    pub fn is_unreachable(&self, module_id: &str) -> bool {
        self.unreachable_modules.iter().any(|m| m == module_id)
    }

    /// Chunks of one kind, in id order
    pub fn chunks_of_kind(&self, kind: ChunkKind) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().filter(move |c| c.kind == kind)
    }
}

/// Chunk membership of a single module, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAnnotation {
    pub id: ModuleId,
    pub chunk_id: Option<usize>,
    pub chunk_color: Option<String>,
    pub unreachable: bool,
}

/// Split `modules` into chunks following `edges`
pub fn compute_chunks(modules: &[ModuleNode], edges: &[ImportEdge]) -> BundleResult {
    let Some(entry) = modules.iter().find(|m| m.is_entry) else {
        debug!("No entry module, {} module(s) unreachable", modules.len());
        return BundleResult {
            chunks: Vec::new(),
            unreachable_modules: modules.iter().map(|m| m.id.clone()).collect(),
        };
    };

    Splitter::new(modules, edges).split(&entry.id)
}

/// Split a whole graph document
pub fn bundle_graph(graph: &DependencyGraph) -> BundleResult {
    compute_chunks(&graph.modules, &graph.edges)
}

/// Tag each module with the chunk it ended up in
pub fn annotate_modules(modules: &[ModuleNode], result: &BundleResult) -> Vec<ModuleAnnotation> {
    let mut membership: HashMap<&str, &Chunk> = HashMap::new();
    for chunk in &result.chunks {
        for module_id in &chunk.modules {
            membership.insert(module_id.as_str(), chunk);
        }
    }

    modules
        .iter()
        .map(|module| {
            let chunk = membership.get(module.id.as_str());
            ModuleAnnotation {
                id: module.id.clone(),
                chunk_id: chunk.map(|c| c.id),
                chunk_color: chunk.map(|c| c.color.clone()),
                unreachable: result.is_unreachable(&module.id),
            }
        })
        .collect()
}

/// Modules reached from one start module through static imports
#[derive(Debug, Default)]
struct Closure<'a> {
    /// DFS discovery order
    modules: Vec<&'a str>,
    /// Dynamic import targets of any member, duplicates included
    dynamic_targets: Vec<&'a str>,
}

/// A dynamic import waiting to become an async chunk
#[derive(Debug, Clone, Copy)]
struct PendingImport<'a> {
    target: &'a str,
    from_chunk: usize,
}

/// Adjacency view of one graph snapshot
struct Splitter<'a> {
    modules: &'a [ModuleNode],
    names: HashMap<&'a str, &'a str>,
    static_imports: HashMap<&'a str, Vec<&'a str>>,
    dynamic_imports: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Splitter<'a> {
    fn new(modules: &'a [ModuleNode], edges: &'a [ImportEdge]) -> Self {
        let mut names = HashMap::new();
        let mut static_imports: HashMap<&str, Vec<&str>> = HashMap::new();
        for module in modules {
            names.entry(module.id.as_str()).or_insert(module.name.as_str());
            static_imports.entry(module.id.as_str()).or_default();
        }
        let mut dynamic_imports = static_imports.clone();

        for edge in edges {
            // Edges to or from unknown modules are ignored
            if !names.contains_key(edge.target.as_str()) {
                continue;
            }

            let adjacency = match edge.kind {
                ImportKind::Static => &mut static_imports,
                ImportKind::Dynamic => &mut dynamic_imports,
            };
            if let Some(targets) = adjacency.get_mut(edge.source.as_str()) {
                targets.push(edge.target.as_str());
            }
        }

        Self {
            modules,
            names,
            static_imports,
            dynamic_imports,
        }
    }

    fn display_name(&self, id: &'a str) -> &'a str {
        self.names.get(id).copied().unwrap_or(id)
    }

    /// Depth-first walk over static imports from `start`
    fn static_closure(&self, start: &'a str) -> Closure<'a> {
        let mut visited = HashSet::new();
        let mut closure = Closure::default();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            closure.modules.push(current);

            if let Some(targets) = self.static_imports.get(current) {
                stack.extend(targets.iter().copied().filter(|t| !visited.contains(t)));
            }
            if let Some(targets) = self.dynamic_imports.get(current) {
                closure.dynamic_targets.extend(targets.iter().copied());
            }
        }

        closure
    }

    fn split(&self, entry: &'a str) -> BundleResult {
        let mut chunks = Vec::new();
        let mut reached: HashSet<&str> = HashSet::new();
        let mut pending = VecDeque::new();

        let main = self.static_closure(entry);
        reached.extend(main.modules.iter().copied());
        pending.extend(main.dynamic_targets.iter().map(|&target| PendingImport {
            target,
            from_chunk: 0,
        }));
        debug!(
            "Main chunk from '{}' has {} module(s)",
            entry,
            main.modules.len()
        );
        chunks.push(Chunk::main(0, to_owned_ids(&main.modules)));

        let mut processed = HashSet::new();
        while let Some(import) = pending.pop_front() {
            if !processed.insert(import.target) {
                continue;
            }

            let id = chunks.len();
            let closure = self.static_closure(import.target);
            debug!(
                "Async chunk {} for '{}' (imported from chunk {}) has {} module(s)",
                id,
                import.target,
                import.from_chunk,
                closure.modules.len()
            );

            reached.extend(closure.modules.iter().copied());
            pending.extend(closure.dynamic_targets.iter().map(|&target| PendingImport {
                target,
                from_chunk: id,
            }));
            chunks.push(Chunk::async_chunk(
                id,
                to_owned_ids(&closure.modules),
                self.display_name(import.target),
            ));
        }

        self.extract_shared(&mut chunks);

        let unreachable_modules = self
            .modules
            .iter()
            .filter(|m| !reached.contains(m.id.as_str()))
            .map(|m| m.id.clone())
            .collect();

        chunks.retain(|c| !c.is_empty());

        BundleResult {
            chunks,
            unreachable_modules,
        }
    }

    /// Move every module found in two or more chunks into one shared chunk
    fn extract_shared(&self, chunks: &mut Vec<Chunk>) {
        let shared: Vec<ModuleId> = {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            let mut first_seen = Vec::new();
            for chunk in chunks.iter() {
                for module_id in &chunk.modules {
                    let count = counts.entry(module_id.as_str()).or_insert(0);
                    if *count == 0 {
                        first_seen.push(module_id.as_str());
                    }
                    *count += 1;
                }
            }

            first_seen
                .into_iter()
                .filter(|id| counts[id] >= 2)
                .map(str::to_string)
                .collect()
        };

        if shared.is_empty() {
            return;
        }

        let names: Vec<String> = shared
            .iter()
            .map(|id| self.names.get(id.as_str()).map_or(id.as_str(), |n| *n).to_string())
            .collect();
        debug!("Extracting {} shared module(s): {}", shared.len(), names.join(", "));

        let shared_ids: HashSet<&str> = shared.iter().map(String::as_str).collect();
        for chunk in chunks.iter_mut() {
            chunk.modules.retain(|m| !shared_ids.contains(m.as_str()));
        }

        let id = chunks.len();
        chunks.push(Chunk::shared(id, shared, &names));
    }
}

fn to_owned_ids(ids: &[&str]) -> Vec<ModuleId> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn module(id: &str) -> ModuleNode {
        ModuleNode::new(id, format!("{}.ts", id))
    }

    fn entry(id: &str) -> ModuleNode {
        module(id).entry()
    }

    fn stat(source: &str, target: &str) -> ImportEdge {
        ImportEdge::new(format!("{}-{}", source, target), source, target, ImportKind::Static)
    }

    fn dynamic(source: &str, target: &str) -> ImportEdge {
        ImportEdge::new(format!("{}-{}", source, target), source, target, ImportKind::Dynamic)
    }

    /// (id, kind, modules) triples for compact comparisons
    fn summary(result: &BundleResult) -> Vec<(usize, ChunkKind, Vec<&str>)> {
        result
            .chunks
            .iter()
            .map(|c| (c.id, c.kind, c.modules.iter().map(String::as_str).collect()))
            .collect()
    }

    /// Every module is in exactly one chunk or unreachable
    fn assert_partition(modules: &[ModuleNode], result: &BundleResult) {
        let mut seen = HashSet::new();
        for id in result
            .chunks
            .iter()
            .flat_map(|c| c.modules.iter())
            .chain(result.unreachable_modules.iter())
        {
            assert!(seen.insert(id.as_str()), "'{}' appears twice", id);
        }

        let all: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(seen, all);
        assert!(result.chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(compute_chunks(&[], &[]), BundleResult::default());
    }

    #[test]
    fn test_no_entry_everything_unreachable() {
        let modules = vec![module("a"), module("b")];
        let result = compute_chunks(&modules, &[stat("a", "b")]);

        assert!(result.chunks.is_empty());
        assert_eq!(result.unreachable_modules, vec!["a", "b"]);
    }

    #[test]
    fn test_lone_entry() {
        let modules = vec![entry("a")];
        let result = compute_chunks(&modules, &[]);

        assert_eq!(summary(&result), vec![(0, ChunkKind::Main, vec!["a"])]);
        assert_eq!(
            result.chunks[0].reason,
            "Entry point and its static dependencies form the main bundle."
        );
        assert_eq!(result.chunks[0].color, "#3b82f6");
    }

    #[test]
    fn test_all_static_single_chunk() {
        let modules = vec![entry("A"), module("B"), module("C"), module("D")];
        let edges = vec![stat("A", "B"), stat("A", "C"), stat("B", "D")];
        let result = compute_chunks(&modules, &edges);

        // Later siblings are popped first
        assert_eq!(
            summary(&result),
            vec![(0, ChunkKind::Main, vec!["A", "C", "B", "D"])]
        );
        assert!(result.unreachable_modules.is_empty());
    }

    #[test]
    fn test_lazy_routes() {
        let modules = vec![
            entry("A"),
            module("Nav"),
            module("Dash"),
            module("Chart"),
            module("Settings"),
        ];
        let edges = vec![
            stat("A", "Nav"),
            dynamic("A", "Dash"),
            dynamic("A", "Settings"),
            stat("Dash", "Chart"),
        ];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(
            summary(&result),
            vec![
                (0, ChunkKind::Main, vec!["A", "Nav"]),
                (1, ChunkKind::Async, vec!["Dash", "Chart"]),
                (2, ChunkKind::Async, vec!["Settings"]),
            ]
        );
        assert_eq!(
            result.chunks[1].reason,
            "\"Dash.ts\" is loaded with a dynamic import(), so it becomes a separate async \
             chunk that is only downloaded when needed."
        );
        assert!(result.unreachable_modules.is_empty());
    }

    #[test]
    fn test_shared_extraction() {
        let modules = vec![
            entry("A"),
            module("Home"),
            module("Profile"),
            module("Utils"),
            module("Api"),
        ];
        let edges = vec![
            stat("A", "Home"),
            dynamic("A", "Profile"),
            stat("Home", "Utils"),
            stat("Profile", "Utils"),
            stat("Profile", "Api"),
        ];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(
            summary(&result),
            vec![
                (0, ChunkKind::Main, vec!["A", "Home"]),
                (1, ChunkKind::Async, vec!["Profile", "Api"]),
                (2, ChunkKind::Shared, vec!["Utils"]),
            ]
        );
        assert_eq!(
            result.chunks[2].reason,
            "Utils.ts is imported by multiple chunks, so the bundler extracts it into a shared \
             chunk to avoid duplication."
        );
        assert_eq!(result.chunks[2].color, "#f97316");
        assert_partition(&modules, &result);
    }

    #[test]
    fn test_isolated_module_unreachable() {
        let modules = vec![entry("A"), module("B"), module("Lonely"), module("Orphan")];
        let edges = vec![stat("A", "B"), stat("Orphan", "B")];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(result.unreachable_modules, vec!["Lonely", "Orphan"]);
        assert!(result.chunk_of("Lonely").is_none());
        assert_partition(&modules, &result);
    }

    #[test]
    fn test_static_cycle() {
        let modules = vec![entry("a"), module("b"), module("c")];
        let edges = vec![stat("a", "b"), stat("b", "c"), stat("c", "a"), stat("c", "b")];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(
            summary(&result),
            vec![(0, ChunkKind::Main, vec!["a", "b", "c"])]
        );
    }

    #[test]
    fn test_async_ids_follow_breadth_first_discovery() {
        let modules = vec![entry("a"), module("b"), module("c"), module("d"), module("e")];
        let edges = vec![
            dynamic("a", "b"),
            dynamic("a", "c"),
            dynamic("b", "d"),
            dynamic("c", "e"),
        ];
        let result = compute_chunks(&modules, &edges);

        let order: Vec<(usize, &str)> = result
            .chunks
            .iter()
            .map(|c| (c.id, c.modules[0].as_str()))
            .collect();
        assert_eq!(order, vec![(0, "a"), (1, "b"), (2, "c"), (3, "d"), (4, "e")]);
        assert!(result
            .chunks
            .iter()
            .all(|c| c.color == chunk_color(c.id)));
    }

    #[test]
    fn test_dynamic_target_deduplicated() {
        // Both the main chunk and the async chunk for `page` import `modal`
        let modules = vec![entry("app"), module("page"), module("modal")];
        let edges = vec![
            dynamic("app", "page"),
            dynamic("app", "modal"),
            dynamic("page", "modal"),
        ];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(
            summary(&result),
            vec![
                (0, ChunkKind::Main, vec!["app"]),
                (1, ChunkKind::Async, vec!["page"]),
                (2, ChunkKind::Async, vec!["modal"]),
            ]
        );
    }

    #[test]
    fn test_dynamic_and_static_reachable_module_becomes_shared() {
        let modules = vec![entry("app"), module("lib"), module("page")];
        let edges = vec![stat("app", "lib"), dynamic("app", "page"), dynamic("page", "lib")];
        let result = compute_chunks(&modules, &edges);

        // The async chunk for `lib` is emptied by extraction and dropped
        assert_eq!(
            summary(&result),
            vec![
                (0, ChunkKind::Main, vec!["app"]),
                (1, ChunkKind::Async, vec!["page"]),
                (3, ChunkKind::Shared, vec!["lib"]),
            ]
        );
        assert_partition(&modules, &result);
    }

    #[test]
    fn test_dynamic_import_of_own_static_dependency() {
        let modules = vec![entry("a"), module("b")];
        let edges = vec![stat("a", "b"), dynamic("a", "b")];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(
            summary(&result),
            vec![
                (0, ChunkKind::Main, vec!["a"]),
                (2, ChunkKind::Shared, vec!["b"]),
            ]
        );
    }

    #[test]
    fn test_mutual_dynamic_imports_terminate() {
        let modules = vec![entry("a"), module("b")];
        let edges = vec![dynamic("a", "b"), dynamic("b", "a")];
        let result = compute_chunks(&modules, &edges);

        // `a` gets an async chunk of its own, so it is shared with main
        assert_eq!(
            summary(&result),
            vec![
                (1, ChunkKind::Async, vec!["b"]),
                (3, ChunkKind::Shared, vec!["a"]),
            ]
        );
        assert_partition(&modules, &result);
    }

    #[test]
    fn test_shared_modules_keep_first_seen_order() {
        let modules = vec![
            entry("app"),
            module("x"),
            module("y"),
            module("page"),
        ];
        let edges = vec![
            stat("app", "y"),
            stat("app", "x"),
            dynamic("app", "page"),
            stat("page", "x"),
            stat("page", "y"),
        ];
        let result = compute_chunks(&modules, &edges);

        // Main closure visits x before y
        let shared = result.chunks_of_kind(ChunkKind::Shared).next().unwrap();
        assert_eq!(shared.modules, vec!["x", "y"]);
        assert!(shared.reason.starts_with("x.ts, y.ts are imported"));
        assert_partition(&modules, &result);
    }

    #[test]
    fn test_first_entry_wins() {
        let modules = vec![module("z"), entry("b"), entry("a")];
        let edges = vec![stat("a", "z")];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(summary(&result), vec![(0, ChunkKind::Main, vec!["b"])]);
        assert_eq!(result.unreachable_modules, vec!["z", "a"]);
    }

    #[test]
    fn test_dangling_edges_ignored() {
        let modules = vec![entry("a"), module("b")];
        let edges = vec![
            stat("a", "ghost"),
            dynamic("a", "phantom"),
            stat("ghost", "b"),
            stat("a", "b"),
        ];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(summary(&result), vec![(0, ChunkKind::Main, vec!["a", "b"])]);
        assert_partition(&modules, &result);
    }

    #[test]
    fn test_parallel_edges() {
        let modules = vec![entry("a"), module("b")];
        let edges = vec![dynamic("a", "b"), dynamic("a", "b"), stat("b", "b")];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(
            summary(&result),
            vec![
                (0, ChunkKind::Main, vec!["a"]),
                (1, ChunkKind::Async, vec!["b"]),
            ]
        );
    }

    #[test]
    fn test_dynamic_only_target_is_async_not_main() {
        let modules = vec![entry("a"), module("s"), module("lazy")];
        let edges = vec![stat("a", "s"), dynamic("s", "lazy")];
        let result = compute_chunks(&modules, &edges);

        assert_eq!(result.chunk_of("lazy").map(|c| c.kind), Some(ChunkKind::Async));
        assert!(!result.chunks[0].contains("lazy"));
    }

    #[test]
    fn test_idempotent() {
        let graph = crate::graph::presets::find("shared-vendor").unwrap().graph();
        let snapshot = graph.clone();

        let first = bundle_graph(&graph);
        let second = bundle_graph(&graph);
        assert_eq!(first, second);
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn test_presets_partition() {
        for preset in crate::graph::presets::all() {
            let graph = preset.graph();
            assert_partition(&graph.modules, &bundle_graph(&graph));
        }
    }

    #[test]
    fn test_annotate_modules() {
        let modules = vec![entry("a"), module("b"), module("c")];
        let edges = vec![dynamic("a", "b")];
        let result = compute_chunks(&modules, &edges);
        let annotations = annotate_modules(&modules, &result);

        assert_eq!(
            annotations,
            vec![
                ModuleAnnotation {
                    id: "a".into(),
                    chunk_id: Some(0),
                    chunk_color: Some("#3b82f6".into()),
                    unreachable: false,
                },
                ModuleAnnotation {
                    id: "b".into(),
                    chunk_id: Some(1),
                    chunk_color: Some("#10b981".into()),
                    unreachable: false,
                },
                ModuleAnnotation {
                    id: "c".into(),
                    chunk_id: None,
                    chunk_color: None,
                    unreachable: true,
                },
            ]
        );
    }

    #[test]
    fn test_result_json_shape() {
        let result = compute_chunks(&[entry("a"), module("b")], &[]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["chunks"][0]["kind"], "main");
        assert_eq!(json["chunks"][0]["modules"][0], "a");
        assert_eq!(json["unreachableModules"][0], "b");
    }
}
