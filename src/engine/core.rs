// src/engine/core.rs

//! Pure coordinator state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`GraphMutation`]s and [`CoordinatorEvent`]s and produces:
//! - an updated graph and recompute state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading requests from channels
//! - keeping the debounce deadline
//! - running recompute jobs on the blocking pool
//! - publishing graph views and snapshots to readers
//!
//! The core is unit tested without any Tokio runtime.

use std::sync::Arc;

use tracing::{debug, info};

use crate::analysis::PathSnapshot;
use crate::dag::DependencyGraph;
use crate::directory::ItemDirectory;
use crate::engine::event_handlers::{
    CoreCommand, CoreStep, RecomputeJob, RecomputeTracker, apply_mutation, handle_change,
    handle_debounce_elapsed, handle_flush, handle_recompute_finished,
};
use crate::engine::{CoordinatorEvent, EngineSettings, GraphMutation, RecomputeState};
use crate::errors::Result;
use crate::types::GraphVersion;

/// Pure coordinator state.
///
/// This owns:
/// - the current graph (shared copy-on-write with readers)
/// - the recompute tracker
/// - the most recently published snapshot
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
pub struct CoordinatorCore {
    graph: Arc<DependencyGraph>,
    directory: Arc<dyn ItemDirectory>,
    settings: EngineSettings,
    tracker: RecomputeTracker,
    latest: Arc<PathSnapshot>,
}

impl std::fmt::Debug for CoordinatorCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorCore")
            .field("version", &self.graph.version())
            .field("settings", &self.settings)
            .field("tracker", &self.tracker)
            .field("latest", &self.latest.sequence)
            .finish_non_exhaustive()
    }
}

impl CoordinatorCore {
    pub fn new(directory: Arc<dyn ItemDirectory>, settings: EngineSettings) -> Self {
        Self::with_graph(DependencyGraph::new(), directory, settings)
    }

    /// Start from a pre-built graph (e.g. loaded from config).
    pub fn with_graph(
        graph: DependencyGraph,
        directory: Arc<dyn ItemDirectory>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            graph: Arc::new(graph),
            directory,
            settings,
            tracker: RecomputeTracker::default(),
            latest: Arc::new(PathSnapshot::empty()),
        }
    }

    pub fn graph(&self) -> &Arc<DependencyGraph> {
        &self.graph
    }

    pub fn latest(&self) -> &Arc<PathSnapshot> {
        &self.latest
    }

    pub fn state(&self) -> RecomputeState {
        self.tracker.state
    }

    /// Expose the follow-up flag (for tests).
    pub fn follow_up_pending(&self) -> bool {
        self.tracker.follow_up
    }

    /// Commands to run once at startup: publish the initial graph, and
    /// schedule a recompute if it already has items.
    pub fn start(&mut self) -> CoreStep {
        let mut commands = vec![CoreCommand::PublishGraph(Arc::clone(&self.graph))];
        if !self.graph.is_empty() {
            info!(items = self.graph.node_count(), "initial graph loaded; scheduling recompute");
            commands.extend(handle_change(&mut self.tracker));
        }
        CoreStep::running(commands)
    }

    /// Apply one mutation.
    ///
    /// The result goes back to the caller; the step tells the shell what to
    /// do about it. Rejected mutations and no-ops produce no commands.
    pub fn apply(&mut self, mutation: GraphMutation) -> (Result<GraphVersion>, CoreStep) {
        let before = self.graph.version();
        let result = apply_mutation(&mut self.graph, self.directory.as_ref(), mutation);

        let mut commands = Vec::new();
        if matches!(result, Ok(version) if version != before) {
            debug!(from = %before, to = %self.graph.version(), "graph mutated");
            commands.push(CoreCommand::PublishGraph(Arc::clone(&self.graph)));
            commands.extend(handle_change(&mut self.tracker));
        }

        (result, CoreStep::running(commands))
    }

    /// Handle a single non-mutation event.
    pub fn step(&mut self, event: CoordinatorEvent) -> CoreStep {
        match event {
            CoordinatorEvent::StatusChanged { item } => {
                if !self.graph.contains(&item) {
                    debug!(%item, "status change for untracked item; ignoring");
                    return CoreStep::running(Vec::new());
                }
                debug!(%item, "status changed; snapshot is stale");
                CoreStep::running(handle_change(&mut self.tracker))
            }
            CoordinatorEvent::DebounceElapsed => {
                let job = self.job();
                CoreStep::running(handle_debounce_elapsed(&mut self.tracker, job))
            }
            CoordinatorEvent::FlushRequested => {
                let job = self.job();
                let up_to_date = self.latest.graph_version == self.graph.version()
                    && (self.latest.sequence > 0 || self.graph.is_empty());
                CoreStep::running(handle_flush(&mut self.tracker, &self.latest, up_to_date, job))
            }
            CoordinatorEvent::RecomputeFinished(snapshot) => {
                let job = self.job();
                CoreStep::running(handle_recompute_finished(
                    &mut self.tracker,
                    &mut self.latest,
                    Ok(*snapshot),
                    job,
                ))
            }
            CoordinatorEvent::RecomputeFailed(reason) => {
                let job = self.job();
                CoreStep::running(handle_recompute_finished(
                    &mut self.tracker,
                    &mut self.latest,
                    Err(reason),
                    job,
                ))
            }
            CoordinatorEvent::ShutdownRequested => CoreStep::stop(),
        }
    }

    fn job(&self) -> RecomputeJob {
        RecomputeJob {
            graph: Arc::clone(&self.graph),
            directory: Arc::clone(&self.directory),
            max_paths: self.settings.max_paths,
        }
    }
}
