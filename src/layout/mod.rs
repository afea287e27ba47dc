//! Layered top-down auto-layout
//!
//! Ranks modules with a breadth-first walk from the graph's roots, then lines
//! each rank up as a horizontally centered row. Positions are cosmetic; they
//! never influence chunking.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{DependencyGraph, ImportEdge, ModuleNode, Position};

/// Node box and gap sizes used for positioning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub node_width: f64,
    pub node_height: f64,
    pub h_gap: f64,
    pub v_gap: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 60.0,
            h_gap: 60.0,
            v_gap: 80.0,
        }
    }
}

/// Rank of every module: 0 for roots, otherwise deeper than the parents it
/// was reached from. Unreached modules get 0.
pub fn assign_ranks<'a>(modules: &'a [ModuleNode], edges: &[ImportEdge]) -> HashMap<&'a str, usize> {
    let known: HashSet<&'a str> = modules.iter().map(|m| m.id.as_str()).collect();

    let mut children: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
    let mut in_degree: HashMap<&'a str, usize> = HashMap::new();
    for edge in edges {
        // Keys borrow from `modules`; edges naming unknown ids are skipped
        let (Some(&source), Some(&target)) =
            (known.get(edge.source.as_str()), known.get(edge.target.as_str()))
        else {
            continue;
        };
        children.entry(source).or_default().push(target);
        *in_degree.entry(target).or_insert(0) += 1;
    }

    let mut rank: HashMap<&'a str, usize> = HashMap::new();
    let mut queue = VecDeque::new();

    for module in modules {
        let id = module.id.as_str();
        if in_degree.get(id).copied().unwrap_or(0) == 0 && !rank.contains_key(id) {
            rank.insert(id, 0);
            queue.push_back(id);
        }
    }

    // Every module has a parent, so start anywhere
    if queue.is_empty() {
        if let Some(first) = modules.first() {
            rank.insert(first.id.as_str(), 0);
            queue.push_back(first.id.as_str());
        }
    }

    while let Some(current) = queue.pop_front() {
        let current_rank = rank.get(current).copied().unwrap_or(0);
        for &child in children.get(current).map(Vec::as_slice).unwrap_or(&[]) {
            match rank.get_mut(child) {
                Some(existing) => *existing = (*existing).max(current_rank + 1),
                None => {
                    rank.insert(child, current_rank + 1);
                    queue.push_back(child);
                }
            }
        }
    }

    for module in modules {
        rank.entry(module.id.as_str()).or_insert(0);
    }

    rank
}

/// Position `modules` in layers. Returns new modules; inputs are untouched.
pub fn layout(modules: &[ModuleNode], edges: &[ImportEdge], options: &LayoutOptions) -> Vec<ModuleNode> {
    if modules.is_empty() {
        return Vec::new();
    }

    let ranks = assign_ranks(modules, edges);

    let mut layers: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, module) in modules.iter().enumerate() {
        let rank = ranks.get(module.id.as_str()).copied().unwrap_or(0);
        layers.entry(rank).or_default().push(index);
    }

    let step_x = options.node_width + options.h_gap;
    let step_y = options.node_height + options.v_gap;
    let row_width = |len: usize| len as f64 * step_x - options.h_gap;

    let widest = layers.values().map(Vec::len).max().unwrap_or(0);
    let total_width = row_width(widest);

    let mut positions = vec![Position::default(); modules.len()];
    for (&rank, indices) in &layers {
        let offset_x = (total_width - row_width(indices.len())) / 2.0;
        for (i, &index) in indices.iter().enumerate() {
            positions[index] = Position::new(offset_x + i as f64 * step_x, rank as f64 * step_y);
        }
    }

    debug!(
        "Laid out {} module(s) in {} layer(s)",
        modules.len(),
        layers.len()
    );

    modules
        .iter()
        .zip(positions)
        .map(|(module, position)| ModuleNode {
            position,
            ..module.clone()
        })
        .collect()
}

/// Lay out a graph document; edges are carried over unchanged
pub fn layout_graph(graph: &DependencyGraph, options: &LayoutOptions) -> DependencyGraph {
    DependencyGraph {
        modules: layout(&graph.modules, &graph.edges, options),
        edges: graph.edges.clone(),
    }
}
