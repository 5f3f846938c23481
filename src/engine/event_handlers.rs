// src/engine/event_handlers.rs

//! Event handling logic for the coordinator core.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::analysis::{PathSnapshot, compute_snapshot};
use crate::dag::DependencyGraph;
use crate::directory::ItemDirectory;
use crate::engine::{GraphMutation, RecomputeState};
use crate::errors::{CritpathError, Result};
use crate::types::{DEFAULT_WEIGHT, GraphVersion, ItemId, Weight};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Make this graph view visible to readers.
    PublishGraph(Arc<DependencyGraph>),
    /// Start (or restart) the debounce window.
    ArmDebounce,
    /// Drop the pending debounce deadline.
    CancelDebounce,
    /// Run this job off the mutation path and report back.
    StartRecompute(RecomputeJob),
    /// Make this snapshot visible to readers.
    PublishSnapshot(Arc<PathSnapshot>),
    /// Answer every waiting flush with this snapshot.
    ResolveFlush(Arc<PathSnapshot>),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

/// Everything a recompute needs, detached from the mutation path.
///
/// The graph is an immutable `Arc`; later mutations copy-on-write and never
/// touch it.
pub struct RecomputeJob {
    pub graph: Arc<DependencyGraph>,
    pub directory: Arc<dyn ItemDirectory>,
    pub max_paths: usize,
}

impl fmt::Debug for RecomputeJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecomputeJob")
            .field("version", &self.graph.version())
            .field("nodes", &self.graph.node_count())
            .field("max_paths", &self.max_paths)
            .finish_non_exhaustive()
    }
}

impl RecomputeJob {
    pub fn run(self) -> Result<PathSnapshot> {
        compute_snapshot(&self.graph, self.directory.as_ref(), self.max_paths)
    }
}

/// Recompute bookkeeping owned by the core.
#[derive(Debug, Default)]
pub struct RecomputeTracker {
    pub state: RecomputeState,
    /// A change arrived while `Recomputing`; run exactly one more.
    pub follow_up: bool,
    /// Some caller is waiting for an up-to-date snapshot.
    pub flush_pending: bool,
    /// Number of snapshots published so far.
    pub published: u64,
}

/// Apply one mutation to the graph.
///
/// All validation happens against the shared `Arc` before `make_mut`, so a
/// rejected mutation never clones or changes the graph. Returns the graph
/// version after the call (unchanged for no-ops).
pub fn apply_mutation(
    graph: &mut Arc<DependencyGraph>,
    directory: &dyn ItemDirectory,
    mutation: GraphMutation,
) -> Result<GraphVersion> {
    match mutation {
        GraphMutation::AddDependency {
            dependent,
            dependency,
            kind,
            actor,
        } => {
            ensure_known(directory, &dependent)?;
            ensure_known(directory, &dependency)?;

            if graph.has_edge(&dependent, &dependency) {
                debug!(%dependent, %dependency, "dependency already present; nothing to do");
                return Ok(graph.version());
            }
            if let Err(err) = graph.check_edge(&dependent, &dependency) {
                warn!(%dependent, %dependency, "rejected dependency: would create a cycle");
                return Err(err);
            }

            let g = Arc::make_mut(graph);
            for id in [&dependent, &dependency] {
                if !g.contains(id) {
                    g.insert_node(id.clone(), initial_weight(directory, id));
                }
            }
            g.add_edge(&dependent, &dependency, kind, actor)?;
        }
        GraphMutation::RemoveDependency {
            dependent,
            dependency,
        } => {
            if !graph.has_edge(&dependent, &dependency) {
                debug!(%dependent, %dependency, "remove of unknown dependency");
                return Err(CritpathError::NotFound {
                    dependent,
                    dependency,
                });
            }
            Arc::make_mut(graph).remove_edge(&dependent, &dependency)?;
        }
        GraphMutation::TrackItem { item } => {
            ensure_known(directory, &item)?;
            if !graph.contains(&item) {
                let weight = initial_weight(directory, &item);
                Arc::make_mut(graph).insert_node(item, weight);
            }
        }
        GraphMutation::RemoveItem { item } => {
            if !graph.contains(&item) {
                return Err(CritpathError::ItemNotFound(item));
            }
            Arc::make_mut(graph).remove_node(&item)?;
        }
        GraphMutation::SetWeight { item, weight } => {
            match graph.weight(&item) {
                None => return Err(CritpathError::ItemNotFound(item)),
                Some(current) if current == weight => {}
                Some(_) => Arc::make_mut(graph).set_weight(&item, weight)?,
            }
        }
    }

    Ok(graph.version())
}

fn ensure_known(directory: &dyn ItemDirectory, id: &ItemId) -> Result<()> {
    if directory.item_exists(id) {
        Ok(())
    } else {
        warn!(item = %id, "item unknown to the work-item directory");
        Err(CritpathError::UnknownNode(id.clone()))
    }
}

fn initial_weight(directory: &dyn ItemDirectory, id: &ItemId) -> Weight {
    directory.item_estimate(id).unwrap_or(DEFAULT_WEIGHT)
}

/// Handle a graph mutation or status change that invalidates the snapshot.
///
/// - `Idle` / `PendingRecompute`: (re)start the debounce window.
/// - `Recomputing`: remember exactly one follow-up.
pub fn handle_change(tracker: &mut RecomputeTracker) -> Vec<CoreCommand> {
    match tracker.state {
        RecomputeState::Idle | RecomputeState::PendingRecompute => {
            tracker.state = RecomputeState::PendingRecompute;
            vec![CoreCommand::ArmDebounce]
        }
        RecomputeState::Recomputing => {
            if !tracker.follow_up {
                debug!("change during recompute; scheduling one follow-up");
            }
            tracker.follow_up = true;
            Vec::new()
        }
    }
}

/// Handle the debounce window closing.
pub fn handle_debounce_elapsed(tracker: &mut RecomputeTracker, job: RecomputeJob) -> Vec<CoreCommand> {
    match tracker.state {
        RecomputeState::PendingRecompute => {
            debug!(?job, "debounce window closed; starting recompute");
            tracker.state = RecomputeState::Recomputing;
            vec![CoreCommand::StartRecompute(job)]
        }
        other => {
            debug!(state = ?other, "ignoring stale debounce deadline");
            Vec::new()
        }
    }
}

/// Handle an explicit flush request.
///
/// `up_to_date` says whether `latest` already reflects the current graph.
pub fn handle_flush(
    tracker: &mut RecomputeTracker,
    latest: &Arc<PathSnapshot>,
    up_to_date: bool,
    job: RecomputeJob,
) -> Vec<CoreCommand> {
    match tracker.state {
        RecomputeState::Idle if up_to_date => {
            vec![CoreCommand::ResolveFlush(Arc::clone(latest))]
        }
        RecomputeState::Idle => {
            tracker.state = RecomputeState::Recomputing;
            tracker.flush_pending = true;
            vec![CoreCommand::StartRecompute(job)]
        }
        RecomputeState::PendingRecompute => {
            debug!("flush requested; skipping the rest of the debounce window");
            tracker.state = RecomputeState::Recomputing;
            tracker.flush_pending = true;
            vec![CoreCommand::CancelDebounce, CoreCommand::StartRecompute(job)]
        }
        RecomputeState::Recomputing => {
            tracker.flush_pending = true;
            Vec::new()
        }
    }
}

/// Handle the end of a recompute job.
///
/// On success the snapshot gets the next sequence number and is published.
/// Either way, a recorded follow-up runs next (immediately if a flush is
/// waiting, otherwise after a fresh debounce window); without one the
/// coordinator goes idle and answers waiting flushes.
pub fn handle_recompute_finished(
    tracker: &mut RecomputeTracker,
    latest: &mut Arc<PathSnapshot>,
    outcome: std::result::Result<PathSnapshot, String>,
    job: RecomputeJob,
) -> Vec<CoreCommand> {
    let mut commands = Vec::new();

    match outcome {
        Ok(mut snapshot) => {
            tracker.published += 1;
            snapshot.sequence = tracker.published;
            info!(
                sequence = snapshot.sequence,
                version = %snapshot.graph_version,
                critical_length = snapshot.critical.length,
                critical_paths = snapshot.critical.paths.len(),
                "publishing path snapshot"
            );
            *latest = Arc::new(snapshot);
            commands.push(CoreCommand::PublishSnapshot(Arc::clone(latest)));
        }
        Err(reason) => {
            error!(%reason, "recompute failed; keeping previous snapshot");
        }
    }

    if tracker.follow_up {
        tracker.follow_up = false;
        if tracker.flush_pending {
            tracker.state = RecomputeState::Recomputing;
            commands.push(CoreCommand::StartRecompute(job));
        } else {
            tracker.state = RecomputeState::PendingRecompute;
            commands.push(CoreCommand::ArmDebounce);
        }
    } else {
        tracker.state = RecomputeState::Idle;
        if tracker.flush_pending {
            tracker.flush_pending = false;
            commands.push(CoreCommand::ResolveFlush(Arc::clone(latest)));
        }
    }

    commands
}
