// src/dag/topo.rs

//! Kahn's-algorithm topological ordering over a [`DependencyGraph`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::dag::DependencyGraph;
use crate::errors::{CritpathError, Result};
use crate::types::ItemId;

/// Linear order in which every dependency precedes its dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalOrder {
    /// All items, dependencies first. Among items that become ready at the
    /// same time, the smaller id comes first.
    pub order: Vec<ItemId>,
    /// Items with no dependencies.
    pub sources: BTreeSet<ItemId>,
    /// Items with no dependents.
    pub sinks: BTreeSet<ItemId>,
    /// Items with neither (both a source and a sink).
    pub isolated: BTreeSet<ItemId>,
}

impl TopologicalOrder {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of every item in `order`.
    pub fn positions(&self) -> BTreeMap<&ItemId, usize> {
        self.order.iter().enumerate().map(|(i, id)| (id, i)).collect()
    }
}

/// Build the topological order for `graph`.
///
/// The graph is acyclic by construction, but this still re-checks: if any
/// node is left with a non-zero in-degree once the ready set drains, the
/// leftover nodes are reported in a [`CritpathError::CycleDetected`].
pub fn build(graph: &DependencyGraph) -> Result<TopologicalOrder> {
    let mut remaining: BTreeMap<&ItemId, usize> = BTreeMap::new();
    let mut ready: BTreeSet<&ItemId> = BTreeSet::new();
    let mut result = TopologicalOrder::default();

    for id in graph.nodes() {
        let in_degree = graph.in_degree(id);
        let out_degree = graph.out_degree(id);

        if in_degree == 0 {
            ready.insert(id);
            result.sources.insert(id.clone());
        }
        if out_degree == 0 {
            result.sinks.insert(id.clone());
        }
        if in_degree == 0 && out_degree == 0 {
            result.isolated.insert(id.clone());
        }
        remaining.insert(id, in_degree);
    }

    while let Some(id) = ready.pop_first() {
        result.order.push(id.clone());

        for dependent in graph.dependents_of(id) {
            if let Some(count) = remaining.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if result.order.len() != graph.node_count() {
        let stuck: Vec<&str> = remaining
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(id, _)| id.as_str())
            .collect();
        warn!(?stuck, "topological sort left nodes unprocessed");
        return Err(CritpathError::CycleDetected(format!(
            "cycle detected involving items {:?}",
            stuck
        )));
    }

    debug!(
        nodes = result.order.len(),
        sources = result.sources.len(),
        sinks = result.sinks.len(),
        isolated = result.isolated.len(),
        "built topological order"
    );

    Ok(result)
}
