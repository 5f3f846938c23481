// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::errors::{CritpathError, Result};
use crate::types::{Direction, GraphVersion, ItemId, Weight};

/// Internal node structure: stores weight plus immediate deps and dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DagNode {
    weight: Weight,
    /// Direct dependencies: items that must be done before this one starts.
    deps: BTreeSet<ItemId>,
    /// Direct dependents: items waiting on this one.
    dependents: BTreeSet<ItemId>,
}

impl DagNode {
    fn new(weight: Weight) -> Self {
        Self {
            weight,
            deps: BTreeSet::new(),
            dependents: BTreeSet::new(),
        }
    }
}

/// Audit data kept for every dependency edge.
///
/// None of this affects path weight; it is preserved for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMeta {
    pub kind: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A dependency edge as exposed to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub dependent: ItemId,
    pub dependency: ItemId,
    pub meta: EdgeMeta,
}

/// Outcome of a successful `add_edge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    /// The edge already existed; nothing changed.
    AlreadyPresent,
}

/// In-memory dependency DAG keyed by item id.
///
/// Acyclicity is enforced on every insertion, so any value of this type is a
/// valid DAG. Ordered maps keep iteration (and therefore every derived
/// result) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: BTreeMap<ItemId, DagNode>,
    /// Keyed by `(dependent, dependency)`.
    edges: BTreeMap<(ItemId, ItemId), EdgeMeta>,
    version: GraphVersion,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mutation counter.
    pub fn version(&self) -> GraphVersion {
        self.version
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All tracked items in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &ItemId> {
        self.nodes.keys()
    }

    pub fn weight(&self, id: &ItemId) -> Option<Weight> {
        self.nodes.get(id).map(|n| n.weight)
    }

    /// All edges ordered by `(dependent, dependency)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().map(|((dependent, dependency), meta)| Edge {
            dependent: dependent.clone(),
            dependency: dependency.clone(),
            meta: meta.clone(),
        })
    }

    pub fn edge(&self, dependent: &ItemId, dependency: &ItemId) -> Option<&EdgeMeta> {
        self.edges.get(&(dependent.clone(), dependency.clone()))
    }

    pub fn has_edge(&self, dependent: &ItemId, dependency: &ItemId) -> bool {
        self.nodes
            .get(dependent)
            .is_some_and(|n| n.deps.contains(dependency))
    }

    /// Immediate dependencies of an item (the items it waits on).
    pub fn dependencies_of<'a>(&'a self, id: &ItemId) -> impl Iterator<Item = &'a ItemId> + use<'a> {
        self.nodes.get(id).into_iter().flat_map(|n| n.deps.iter())
    }

    /// Immediate dependents of an item (the items waiting on it).
    pub fn dependents_of<'a>(&'a self, id: &ItemId) -> impl Iterator<Item = &'a ItemId> + use<'a> {
        self.nodes.get(id).into_iter().flat_map(|n| n.dependents.iter())
    }

    pub fn in_degree(&self, id: &ItemId) -> usize {
        self.nodes.get(id).map_or(0, |n| n.deps.len())
    }

    pub fn out_degree(&self, id: &ItemId) -> usize {
        self.nodes.get(id).map_or(0, |n| n.dependents.len())
    }

    /// Neighbours of `id` in ascending id order.
    pub fn neighbors(&self, id: &ItemId, direction: Direction) -> Vec<ItemId> {
        match direction {
            Direction::Dependencies => self.dependencies_of(id).cloned().collect(),
            Direction::Dependents => self.dependents_of(id).cloned().collect(),
        }
    }

    /// Whether `to` can be reached from `from` by following dependency edges
    /// (i.e. `from` transitively waits on `to`).
    pub fn is_reachable(&self, from: &ItemId, to: &ItemId) -> bool {
        if from == to {
            return true;
        }

        let mut stack: Vec<&ItemId> = vec![from];
        let mut visited: BTreeSet<&ItemId> = BTreeSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for dep in self.dependencies_of(current) {
                if dep == to {
                    return true;
                }
                stack.push(dep);
            }
        }

        false
    }

    /// Check that `dependent -> dependency` could be inserted, without
    /// touching the graph.
    ///
    /// Nodes that are not tracked yet are fine here: a node without edges
    /// cannot close a cycle.
    pub fn check_edge(&self, dependent: &ItemId, dependency: &ItemId) -> Result<()> {
        if dependent == dependency || self.is_reachable(dependency, dependent) {
            return Err(CritpathError::Cycle {
                dependent: dependent.clone(),
                dependency: dependency.clone(),
            });
        }
        Ok(())
    }

    /// Track an item. Returns `false` if it was already present.
    pub fn insert_node(&mut self, id: ItemId, weight: Weight) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        debug!(item = %id, weight, "tracking item");
        self.nodes.insert(id, DagNode::new(weight));
        self.bump();
        true
    }

    /// Drop an item and every edge touching it.
    pub fn remove_node(&mut self, id: &ItemId) -> Result<()> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| CritpathError::ItemNotFound(id.clone()))?;

        for dep in &node.deps {
            if let Some(dep_node) = self.nodes.get_mut(dep) {
                dep_node.dependents.remove(id);
            }
            self.edges.remove(&(id.clone(), dep.clone()));
        }
        for dependent in &node.dependents {
            if let Some(dependent_node) = self.nodes.get_mut(dependent) {
                dependent_node.deps.remove(id);
            }
            self.edges.remove(&(dependent.clone(), id.clone()));
        }

        debug!(
            item = %id,
            dropped_edges = node.deps.len() + node.dependents.len(),
            "removed item"
        );
        self.bump();
        Ok(())
    }

    /// Change an item's weight. Setting the current weight is a no-op.
    pub fn set_weight(&mut self, id: &ItemId, weight: Weight) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| CritpathError::ItemNotFound(id.clone()))?;
        if node.weight != weight {
            node.weight = weight;
            self.bump();
        }
        Ok(())
    }

    /// Insert `dependent -> dependency` (dependency must finish first).
    ///
    /// Both items must already be tracked. The cycle check runs before any
    /// change, so a rejected edge leaves the graph untouched.
    pub fn add_edge(
        &mut self,
        dependent: &ItemId,
        dependency: &ItemId,
        kind: impl Into<String>,
        actor: impl Into<String>,
    ) -> Result<EdgeInsert> {
        for id in [dependent, dependency] {
            if !self.nodes.contains_key(id) {
                return Err(CritpathError::UnknownNode(id.clone()));
            }
        }

        if self.has_edge(dependent, dependency) {
            debug!(%dependent, %dependency, "dependency already present");
            return Ok(EdgeInsert::AlreadyPresent);
        }

        self.check_edge(dependent, dependency)?;

        let meta = EdgeMeta {
            kind: kind.into(),
            created_by: actor.into(),
            created_at: Utc::now(),
        };
        debug!(%dependent, %dependency, kind = %meta.kind, actor = %meta.created_by, "adding dependency");

        if let Some(node) = self.nodes.get_mut(dependent) {
            node.deps.insert(dependency.clone());
        }
        if let Some(node) = self.nodes.get_mut(dependency) {
            node.dependents.insert(dependent.clone());
        }
        self.edges
            .insert((dependent.clone(), dependency.clone()), meta);
        self.bump();

        Ok(EdgeInsert::Added)
    }

    /// Remove `dependent -> dependency`.
    pub fn remove_edge(&mut self, dependent: &ItemId, dependency: &ItemId) -> Result<()> {
        if self
            .edges
            .remove(&(dependent.clone(), dependency.clone()))
            .is_none()
        {
            return Err(CritpathError::NotFound {
                dependent: dependent.clone(),
                dependency: dependency.clone(),
            });
        }

        if let Some(node) = self.nodes.get_mut(dependent) {
            node.deps.remove(dependency);
        }
        if let Some(node) = self.nodes.get_mut(dependency) {
            node.dependents.remove(dependent);
        }

        debug!(%dependent, %dependency, "removed dependency");
        self.bump();
        Ok(())
    }

    fn bump(&mut self) {
        self.version = self.version.next();
    }
}
