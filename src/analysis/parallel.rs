// src/analysis/parallel.rs

//! Ranking of parallel source-to-sink paths by slack.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::analysis::AnalysisError;
use crate::analysis::critical::{CriticalPath, LongestPaths, path_length, path_to};
use crate::dag::{DependencyGraph, TopologicalOrder};
use crate::types::{ItemId, Path, Weight};

/// One source-to-sink path with its schedule risk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPath {
    pub path: Path,
    pub length: Weight,
    /// `critical_length - length`.
    pub slack: Weight,
    pub is_critical: bool,
}

/// How a [`RankedPaths`] result was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankingMode {
    /// Every source-to-sink path was enumerated.
    #[default]
    Exhaustive,
    /// Too many paths: only the heaviest path through each outgoing edge of
    /// every fan-out item, plus the critical paths.
    FanOutFallback,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedPaths {
    pub mode: RankingMode,
    /// Ascending slack, then lexicographic path order.
    pub paths: Vec<RankedPath>,
}

impl RankedPaths {
    pub fn critical(&self) -> impl Iterator<Item = &RankedPath> {
        self.paths.iter().filter(|p| p.is_critical)
    }

    pub fn near_critical(&self) -> impl Iterator<Item = &RankedPath> {
        self.paths.iter().filter(|p| !p.is_critical)
    }
}

/// Rank the source-to-sink paths of `graph` against `critical`.
///
/// Enumeration stops as soon as more than `max_paths` paths exist; the
/// fan-out fallback is used instead.
pub fn rank(
    graph: &DependencyGraph,
    order: &TopologicalOrder,
    longest: &LongestPaths,
    critical: &CriticalPath,
    max_paths: usize,
) -> RankedPaths {
    let (mode, paths) = match enumerate_paths(graph, order, max_paths) {
        Ok(paths) => (RankingMode::Exhaustive, paths),
        Err(AnalysisError::PathCountExceeded { limit }) => {
            warn!(
                limit,
                "too many source-to-sink paths; ranking fan-out branches only"
            );
            (
                RankingMode::FanOutFallback,
                fan_out_paths(graph, order, longest, critical),
            )
        }
    };

    let mut ranked: Vec<RankedPath> = paths
        .into_iter()
        .map(|path| {
            let length = path_length(graph, &path);
            let slack = critical.length.saturating_sub(length);
            RankedPath {
                path,
                length,
                slack,
                is_critical: slack == 0,
            }
        })
        .collect();

    ranked.sort_by(|a, b| a.slack.cmp(&b.slack).then_with(|| a.path.cmp(&b.path)));

    debug!(?mode, paths = ranked.len(), "ranked parallel paths");

    RankedPaths {
        mode,
        paths: ranked,
    }
}

/// Every source-to-sink path, sources and branches visited in id order.
pub fn enumerate_paths(
    graph: &DependencyGraph,
    order: &TopologicalOrder,
    max_paths: usize,
) -> Result<Vec<Path>, AnalysisError> {
    let mut paths: Vec<Path> = Vec::new();

    for source in &order.sources {
        let mut stack: Vec<Vec<&ItemId>> = vec![vec![source]];

        while let Some(partial) = stack.pop() {
            let Some(&tail) = partial.last() else {
                continue;
            };

            if graph.out_degree(tail) == 0 {
                if paths.len() == max_paths {
                    return Err(AnalysisError::PathCountExceeded { limit: max_paths });
                }
                paths.push(partial.iter().map(|id| (*id).clone()).collect());
                continue;
            }

            let next: Vec<&ItemId> = graph.dependents_of(tail).collect();
            for dependent in next.into_iter().rev() {
                let mut extended = partial.clone();
                extended.push(dependent);
                stack.push(extended);
            }
        }
    }

    Ok(paths)
}

/// Heaviest path through each outgoing edge of each fan-out item, plus the
/// critical paths. Bounded by the edge count.
fn fan_out_paths(
    graph: &DependencyGraph,
    order: &TopologicalOrder,
    longest: &LongestPaths,
    critical: &CriticalPath,
) -> Vec<Path> {
    let mut unique: BTreeSet<Path> = critical.paths.iter().cloned().collect();

    for fork in order.order.iter().filter(|id| graph.out_degree(id) > 1) {
        let prefix = path_to(graph, longest, fork);

        for branch in graph.dependents_of(fork) {
            let mut path = prefix.clone();
            path.extend(heaviest_suffix(graph, longest, branch));
            unique.insert(path);
        }
    }

    unique.into_iter().collect()
}

/// Heaviest `start`-to-sink path, starting at `start`. Ties go to the smaller
/// id.
fn heaviest_suffix(graph: &DependencyGraph, longest: &LongestPaths, start: &ItemId) -> Path {
    let mut path = vec![start.clone()];
    let mut current = start;

    loop {
        let best = graph.dependents_of(current).map(|d| longest.longest_from(d)).max();
        let next = graph
            .dependents_of(current)
            .find(|d| Some(longest.longest_from(d)) == best);
        match next {
            Some(dependent) => {
                path.push(dependent.clone());
                current = dependent;
            }
            None => break,
        }
    }

    path
}

/// Per-item total float: how far an item can slip without extending the
/// critical length.
pub fn item_float(
    graph: &DependencyGraph,
    order: &TopologicalOrder,
    longest: &LongestPaths,
    critical_length: Weight,
) -> BTreeMap<ItemId, Weight> {
    order
        .order
        .iter()
        .map(|id| {
            let through = longest.through(graph, id);
            (id.clone(), critical_length.saturating_sub(through))
        })
        .collect()
}
