// src/analysis/snapshot.rs

//! Immutable result of one full recompute.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::debug;

use crate::analysis::critical::{self, CriticalPath, LongestPaths};
use crate::analysis::parallel::{self, RankedPath, RankedPaths};
use crate::dag::{DependencyGraph, topo};
use crate::directory::ItemDirectory;
use crate::errors::Result;
use crate::types::{GraphVersion, ItemId, ItemStatus, Path, Weight};

/// Everything readers need about the last completed recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSnapshot {
    /// Publication counter, assigned by the coordinator (0 = never computed).
    pub sequence: u64,
    /// Version of the graph this snapshot was computed from.
    pub graph_version: GraphVersion,
    pub critical: CriticalPath,
    pub ranked: RankedPaths,
    /// Total float per item.
    pub item_float: BTreeMap<ItemId, Weight>,
    pub sources: BTreeSet<ItemId>,
    pub sinks: BTreeSet<ItemId>,
    /// First item on the primary critical path that is not done, as of the
    /// status read during this recompute.
    pub first_active: Option<ItemId>,
    /// Running finish offset of each not-done item on the primary critical
    /// path, in weight units from the start of outstanding work.
    pub finish_offsets: BTreeMap<ItemId, Weight>,
    /// Items on the primary critical path whose status is `blocked`.
    pub blocked_on_path: Vec<ItemId>,
    pub computed_at: DateTime<Utc>,
}

impl PathSnapshot {
    /// Placeholder published before the first recompute.
    pub fn empty() -> Self {
        Self {
            sequence: 0,
            graph_version: GraphVersion::default(),
            critical: CriticalPath::default(),
            ranked: RankedPaths::default(),
            item_float: BTreeMap::new(),
            sources: BTreeSet::new(),
            sinks: BTreeSet::new(),
            first_active: None,
            finish_offsets: BTreeMap::new(),
            blocked_on_path: Vec::new(),
            computed_at: Utc::now(),
        }
    }

    pub fn critical_length(&self) -> Weight {
        self.critical.length
    }

    pub fn critical_paths(&self) -> &[Path] {
        &self.critical.paths
    }

    pub fn ranked_paths(&self) -> &[RankedPath] {
        &self.ranked.paths
    }

    pub fn is_on_critical_path(&self, id: &ItemId) -> bool {
        self.critical.contains(id)
    }

    pub fn float_of(&self, id: &ItemId) -> Option<Weight> {
        self.item_float.get(id).copied()
    }

    /// Items that can slip without moving the critical length, with how far.
    pub fn delayable(&self) -> impl Iterator<Item = (&ItemId, Weight)> {
        self.item_float
            .iter()
            .filter(|(_, float)| **float > 0)
            .map(|(id, float)| (id, *float))
    }

    /// Finish offsets laid out as calendar dates, one weight unit per day
    /// starting at `start`.
    pub fn completion_dates(&self, start: NaiveDate) -> BTreeMap<ItemId, NaiveDate> {
        self.finish_offsets
            .iter()
            .filter_map(|(id, offset)| {
                start
                    .checked_add_days(Days::new(*offset))
                    .map(|date| (id.clone(), date))
            })
            .collect()
    }
}

/// Run a full recompute over `graph`.
///
/// Statuses are read from `directory` only to locate the first active item;
/// they never change path lengths.
pub fn compute_snapshot(
    graph: &DependencyGraph,
    directory: &dyn ItemDirectory,
    max_paths: usize,
) -> Result<PathSnapshot> {
    let order = topo::build(graph)?;
    let longest = LongestPaths::compute(graph, &order);
    let critical = critical::compute_with(graph, &order, &longest, max_paths);
    let ranked = parallel::rank(graph, &order, &longest, &critical, max_paths);
    let item_float = parallel::item_float(graph, &order, &longest, critical.length);
    let first_active = first_active(&critical, directory);
    let finish_offsets = finish_offsets(graph, &critical, directory);
    let blocked_on_path = blocked_on_path(&critical, directory);

    debug!(
        version = %graph.version(),
        critical_length = critical.length,
        first_active = ?first_active,
        blocked = blocked_on_path.len(),
        "recompute finished"
    );

    Ok(PathSnapshot {
        sequence: 0,
        graph_version: graph.version(),
        critical,
        ranked,
        item_float,
        sources: order.sources,
        sinks: order.sinks,
        first_active,
        finish_offsets,
        blocked_on_path,
        computed_at: Utc::now(),
    })
}

/// Items the directory cannot report on count as not done.
fn first_active(critical: &CriticalPath, directory: &dyn ItemDirectory) -> Option<ItemId> {
    critical
        .primary()?
        .iter()
        .find(|id| !directory.item_status(id).is_some_and(ItemStatus::is_done))
        .cloned()
}

fn finish_offsets(
    graph: &DependencyGraph,
    critical: &CriticalPath,
    directory: &dyn ItemDirectory,
) -> BTreeMap<ItemId, Weight> {
    let mut elapsed: Weight = 0;
    let mut offsets = BTreeMap::new();
    for id in critical.primary().into_iter().flatten() {
        if directory.item_status(id).is_some_and(ItemStatus::is_done) {
            continue;
        }
        elapsed = elapsed.saturating_add(critical::weight_of(graph, id));
        offsets.insert(id.clone(), elapsed);
    }
    offsets
}

fn blocked_on_path(critical: &CriticalPath, directory: &dyn ItemDirectory) -> Vec<ItemId> {
    critical
        .primary()
        .into_iter()
        .flatten()
        .filter(|id| directory.item_status(id) == Some(ItemStatus::Blocked))
        .cloned()
        .collect()
}
