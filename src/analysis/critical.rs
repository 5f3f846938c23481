// src/analysis/critical.rs

//! Longest-path dynamic programming over the topological order.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::dag::{DependencyGraph, TopologicalOrder};
use crate::types::{ItemId, Path, Weight};

/// The critical length and every path that achieves it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriticalPath {
    pub length: Weight,
    /// All maximal source-to-sink paths, in lexicographic order of their id
    /// sequences.
    pub paths: Vec<Path>,
}

impl CriticalPath {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The first critical path in lexicographic order.
    pub fn primary(&self) -> Option<&Path> {
        self.paths.first()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.paths.iter().any(|p| p.contains(id))
    }
}

/// Per-item longest weighted distances, both including the item itself.
#[derive(Debug, Clone, Default)]
pub struct LongestPaths {
    /// Heaviest path from any source that ends at the item.
    pub to: BTreeMap<ItemId, Weight>,
    /// Heaviest path from the item to any sink.
    pub from: BTreeMap<ItemId, Weight>,
}

impl LongestPaths {
    pub fn compute(graph: &DependencyGraph, order: &TopologicalOrder) -> Self {
        let mut to: BTreeMap<ItemId, Weight> = BTreeMap::new();
        for id in &order.order {
            let best_dep = graph
                .dependencies_of(id)
                .filter_map(|dep| to.get(dep).copied())
                .max()
                .unwrap_or(0);
            to.insert(id.clone(), weight_of(graph, id).saturating_add(best_dep));
        }

        let mut from: BTreeMap<ItemId, Weight> = BTreeMap::new();
        for id in order.order.iter().rev() {
            let best_dependent = graph
                .dependents_of(id)
                .filter_map(|d| from.get(d).copied())
                .max()
                .unwrap_or(0);
            from.insert(id.clone(), weight_of(graph, id).saturating_add(best_dependent));
        }

        Self { to, from }
    }

    pub fn longest_to(&self, id: &ItemId) -> Weight {
        self.to.get(id).copied().unwrap_or(0)
    }

    pub fn longest_from(&self, id: &ItemId) -> Weight {
        self.from.get(id).copied().unwrap_or(0)
    }

    /// Heaviest source-to-sink path through `id`.
    pub fn through(&self, graph: &DependencyGraph, id: &ItemId) -> Weight {
        self.longest_to(id)
            .saturating_add(self.longest_from(id))
            .saturating_sub(weight_of(graph, id))
    }
}

/// Compute the critical length and all critical paths.
///
/// Reconstruction walks forward from every source that starts a heaviest
/// chain, stepping only to dependents that keep it heaviest and visiting
/// smaller ids first. Paths therefore come out in lexicographic order and
/// the first `max_paths` of them are kept.
pub fn compute(graph: &DependencyGraph, order: &TopologicalOrder, max_paths: usize) -> CriticalPath {
    let longest = LongestPaths::compute(graph, order);
    compute_with(graph, order, &longest, max_paths)
}

/// Same as [`compute`], reusing distances the caller already has.
pub fn compute_with(
    graph: &DependencyGraph,
    order: &TopologicalOrder,
    longest: &LongestPaths,
    max_paths: usize,
) -> CriticalPath {
    if order.is_empty() {
        return CriticalPath::default();
    }

    let length = order
        .sources
        .iter()
        .map(|id| longest.longest_from(id))
        .max()
        .unwrap_or(0);

    let mut paths: Vec<Path> = Vec::new();
    let mut truncated = false;

    // Depth-first with larger ids pushed first, so the smallest is explored next.
    let mut stack: Vec<Vec<&ItemId>> = order
        .sources
        .iter()
        .rev()
        .filter(|id| longest.longest_from(id) == length)
        .map(|id| vec![id])
        .collect();

    while let Some(partial) = stack.pop() {
        let Some(&head) = partial.last() else {
            continue;
        };

        if graph.out_degree(head) == 0 {
            if paths.len() >= max_paths {
                truncated = true;
                break;
            }
            paths.push(partial.iter().map(|id| (*id).clone()).collect());
            continue;
        }

        let best = graph
            .dependents_of(head)
            .map(|d| longest.longest_from(d))
            .max()
            .unwrap_or(0);
        let tied: Vec<&ItemId> = graph
            .dependents_of(head)
            .filter(|d| longest.longest_from(d) == best)
            .collect();

        for next_id in tied.into_iter().rev() {
            let mut next = partial.clone();
            next.push(next_id);
            stack.push(next);
        }
    }

    if truncated {
        warn!(max_paths, "critical path reconstruction hit the path limit; result truncated");
    }

    debug!(length, paths = paths.len(), "computed critical path");

    CriticalPath { length, paths }
}

/// Heaviest path ending at `target`, dependency first.
///
/// Ties between dependencies go to the smaller id. Empty when `target` is
/// not tracked.
pub fn path_to(graph: &DependencyGraph, longest: &LongestPaths, target: &ItemId) -> Path {
    if !graph.contains(target) {
        return Path::new();
    }

    let mut path = vec![target.clone()];
    let mut head = target;
    loop {
        let Some(best) = graph.dependencies_of(head).map(|dep| longest.longest_to(dep)).max() else {
            break;
        };
        let Some(dep) = graph
            .dependencies_of(head)
            .find(|dep| longest.longest_to(dep) == best)
        else {
            break;
        };
        path.push(dep.clone());
        head = dep;
    }
    path.reverse();
    path
}

/// Sum of node weights along `path`.
pub fn path_length(graph: &DependencyGraph, path: &[ItemId]) -> Weight {
    path.iter()
        .map(|id| weight_of(graph, id))
        .fold(0, Weight::saturating_add)
}

pub(crate) fn weight_of(graph: &DependencyGraph, id: &ItemId) -> Weight {
    graph.weight(id).unwrap_or(0)
}
