// src/analysis/report.rs

//! Per-item and blocker reports combining a graph view with a snapshot.

use std::collections::BTreeSet;

use tracing::warn;

use crate::analysis::PathSnapshot;
use crate::analysis::critical::{self, LongestPaths};
use crate::dag::{DependencyGraph, blocked, topo};
use crate::types::{Direction, ItemId, Path, Weight};

/// Where one item sits relative to the critical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub item: ItemId,
    pub on_critical_path: bool,
    /// 1-based position on the primary critical path.
    pub position: Option<usize>,
    pub float: Option<Weight>,
    pub direct_dependencies: Vec<ItemId>,
    /// Upstream closure minus the direct dependencies.
    pub indirect_dependencies: Vec<ItemId>,
}

/// Impact of the first active item on the critical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockerReport {
    pub item: ItemId,
    pub directly_blocks: Vec<ItemId>,
    pub total_impact: BTreeSet<ItemId>,
}

/// `None` if `id` is not tracked by `graph`.
pub fn item_report(graph: &DependencyGraph, snapshot: &PathSnapshot, id: &ItemId) -> Option<ItemReport> {
    if !graph.contains(id) {
        return None;
    }

    let direct = graph.neighbors(id, Direction::Dependencies);
    let indirect: Vec<ItemId> = blocked::dependency_closure(graph, id)
        .into_iter()
        .filter(|dep| !direct.contains(dep))
        .collect();

    let position = snapshot
        .critical
        .primary()
        .and_then(|path| path.iter().position(|p| p == id))
        .map(|i| i + 1);

    Some(ItemReport {
        item: id.clone(),
        on_critical_path: snapshot.is_on_critical_path(id),
        position,
        float: snapshot.float_of(id),
        direct_dependencies: direct,
        indirect_dependencies: indirect,
    })
}

pub fn blocker_report(graph: &DependencyGraph, snapshot: &PathSnapshot) -> Option<BlockerReport> {
    let item = snapshot.first_active.as_ref()?;
    Some(BlockerReport {
        item: item.clone(),
        directly_blocks: graph.neighbors(item, Direction::Dependents),
        total_impact: blocked::blocked_by(graph, item),
    })
}

/// Heaviest chain of work that has to finish before `id` can, ending at
/// `id`. Empty for untracked items.
pub fn critical_path_to(graph: &DependencyGraph, id: &ItemId) -> Path {
    if !graph.contains(id) {
        return Path::new();
    }
    match topo::build(graph) {
        Ok(order) => {
            let longest = LongestPaths::compute(graph, &order);
            critical::path_to(graph, &longest, id)
        }
        Err(err) => {
            warn!(%err, item = %id, "graph view failed topological re-check");
            Path::new()
        }
    }
}
