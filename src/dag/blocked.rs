// src/dag/blocked.rs

//! Reachability queries used for blocking-impact reports.

use std::collections::{BTreeSet, VecDeque};

use crate::dag::DependencyGraph;
use crate::types::{Direction, ItemId, ItemStatus};

/// Every item that cannot proceed while `blocked` is unfinished.
///
/// Breadth-first walk over dependent edges. The query item itself is not part
/// of the result, and an unknown item yields an empty set.
pub fn blocked_by(graph: &DependencyGraph, blocked: &ItemId) -> BTreeSet<ItemId> {
    closure(graph, blocked, Direction::Dependents)
}

/// Every item `id` transitively waits on.
pub fn dependency_closure(graph: &DependencyGraph, id: &ItemId) -> BTreeSet<ItemId> {
    closure(graph, id, Direction::Dependencies)
}

fn closure(graph: &DependencyGraph, start: &ItemId, direction: Direction) -> BTreeSet<ItemId> {
    let mut visited: BTreeSet<ItemId> = BTreeSet::new();
    let mut queue: VecDeque<&ItemId> = VecDeque::new();

    if !graph.contains(start) {
        return visited;
    }
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let next: Vec<&ItemId> = match direction {
            Direction::Dependents => graph.dependents_of(current).collect(),
            Direction::Dependencies => graph.dependencies_of(current).collect(),
        };
        for id in next {
            if id != start && visited.insert(id.clone()) {
                queue.push_back(id);
            }
        }
    }

    visited
}

/// An unfinished item that holds up more than one other item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bottleneck {
    pub item: ItemId,
    pub direct_dependents: Vec<ItemId>,
    /// Size of the item's full blocked set.
    pub impact: usize,
}

/// Unfinished items with more than one direct dependent, largest impact
/// first (ties by id).
///
/// `status` is asked for each candidate; items it does not know are treated
/// as unfinished.
pub fn bottlenecks<F>(graph: &DependencyGraph, status: F) -> Vec<Bottleneck>
where
    F: Fn(&ItemId) -> Option<ItemStatus>,
{
    let mut result: Vec<Bottleneck> = graph
        .nodes()
        .filter(|id| graph.out_degree(id) > 1)
        .filter(|id| !status(*id).is_some_and(ItemStatus::is_done))
        .map(|id| Bottleneck {
            item: id.clone(),
            direct_dependents: graph.neighbors(id, Direction::Dependents),
            impact: blocked_by(graph, id).len(),
        })
        .collect();

    result.sort_by(|a, b| b.impact.cmp(&a.impact).then_with(|| a.item.cmp(&b.item)));
    result
}
