// src/engine/handle.rs

//! Cloneable handle for collaborators.
//!
//! Mutations and flushes travel over a channel to the single runtime task.
//! Queries read the latest published graph view and snapshot directly and
//! never wait on the mutation path.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::analysis::{BlockerReport, CriticalPath, ItemReport, PathSnapshot, RankedPath, report};
use crate::dag::{Bottleneck, DependencyGraph, blocked};
use crate::directory::ItemDirectory;
use crate::errors::{CritpathError, Result};
use crate::types::{Direction, GraphVersion, ItemId, Path, Weight};

use super::core::CoordinatorCore;
use super::runtime::{EngineRequest, Runtime};
use super::{EngineSettings, GraphMutation};

const REQUEST_BUFFER: usize = 64;

#[derive(Clone)]
pub struct Engine {
    requests: mpsc::Sender<EngineRequest>,
    graph: watch::Receiver<Arc<DependencyGraph>>,
    snapshots: watch::Receiver<Arc<PathSnapshot>>,
    directory: Arc<dyn ItemDirectory>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("version", &self.graph.borrow().version())
            .field("sequence", &self.snapshots.borrow().sequence)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Start an engine with an empty graph.
    ///
    /// Must be called from within a Tokio runtime. The returned join handle
    /// completes after [`Engine::shutdown`] or once every handle is dropped.
    pub fn spawn(
        directory: Arc<dyn ItemDirectory>,
        settings: EngineSettings,
    ) -> (Self, JoinHandle<Result<()>>) {
        Self::spawn_with_graph(DependencyGraph::new(), directory, settings)
    }

    /// Start an engine seeded with `graph`; a first recompute is scheduled
    /// when it is non-empty.
    pub fn spawn_with_graph(
        graph: DependencyGraph,
        directory: Arc<dyn ItemDirectory>,
        settings: EngineSettings,
    ) -> (Self, JoinHandle<Result<()>>) {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let (graph_tx, graph_rx) = watch::channel(Arc::new(graph.clone()));
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(PathSnapshot::empty()));

        let core = CoordinatorCore::with_graph(graph, Arc::clone(&directory), settings);
        let runtime = Runtime::new(core, settings.debounce, request_rx, graph_tx, snapshot_tx);
        let join = tokio::spawn(runtime.run());

        let engine = Self {
            requests: request_tx,
            graph: graph_rx,
            snapshots: snapshot_rx,
            directory,
        };
        (engine, join)
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Record that `dependent` waits on `dependency`.
    ///
    /// Both items must be known to the directory; they are tracked on first
    /// use. Re-adding an existing edge is a no-op.
    pub async fn add_dependency(
        &self,
        dependent: impl AsRef<str>,
        dependency: impl AsRef<str>,
        kind: impl Into<String>,
        actor: impl Into<String>,
    ) -> Result<GraphVersion> {
        let mutation = GraphMutation::AddDependency {
            dependent: ItemId::parse(dependent)?,
            dependency: ItemId::parse(dependency)?,
            kind: kind.into(),
            actor: actor.into(),
        };
        self.mutate(mutation).await
    }

    pub async fn remove_dependency(
        &self,
        dependent: impl AsRef<str>,
        dependency: impl AsRef<str>,
    ) -> Result<GraphVersion> {
        let mutation = GraphMutation::RemoveDependency {
            dependent: ItemId::parse(dependent)?,
            dependency: ItemId::parse(dependency)?,
        };
        self.mutate(mutation).await
    }

    pub async fn track_item(&self, item: impl AsRef<str>) -> Result<GraphVersion> {
        let item = ItemId::parse(item)?;
        self.mutate(GraphMutation::TrackItem { item }).await
    }

    /// Stop tracking `item` and drop every edge touching it.
    pub async fn remove_item(&self, item: impl AsRef<str>) -> Result<GraphVersion> {
        let item = ItemId::parse(item)?;
        self.mutate(GraphMutation::RemoveItem { item }).await
    }

    pub async fn set_weight(&self, item: impl AsRef<str>, weight: Weight) -> Result<GraphVersion> {
        let item = ItemId::parse(item)?;
        self.mutate(GraphMutation::SetWeight { item, weight }).await
    }

    /// Tell the engine an item's workflow status changed. Schedules a
    /// recompute without touching the graph.
    pub async fn notify_status_changed(&self, item: impl AsRef<str>) -> Result<()> {
        let item = ItemId::parse(item)?;
        self.send(EngineRequest::StatusChanged(item)).await
    }

    /// Wait for a snapshot reflecting every change sent before this call.
    pub async fn flush(&self) -> Result<Arc<PathSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::Flush(reply)).await?;
        rx.await.map_err(|_| CritpathError::EngineStopped)
    }

    /// Ask the runtime to stop. Pending flushes fail with `EngineStopped`.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(EngineRequest::Shutdown).await
    }

    async fn mutate(&self, mutation: GraphMutation) -> Result<GraphVersion> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineRequest::Mutate { mutation, reply }).await?;
        rx.await.map_err(|_| CritpathError::EngineStopped)?
    }

    async fn send(&self, request: EngineRequest) -> Result<()> {
        self.requests.send(request).await.map_err(|_| {
            debug!("engine request channel closed");
            CritpathError::EngineStopped
        })
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Latest published snapshot. Sequence 0 means nothing has been computed.
    pub fn current_snapshot(&self) -> Arc<PathSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Receiver notified on every snapshot publication.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PathSnapshot>> {
        self.snapshots.clone()
    }

    /// Immutable view of the graph after the last applied mutation.
    pub fn graph_view(&self) -> Arc<DependencyGraph> {
        Arc::clone(&self.graph.borrow())
    }

    pub fn critical_path(&self) -> CriticalPath {
        self.current_snapshot().critical.clone()
    }

    pub fn critical_length(&self) -> Weight {
        self.current_snapshot().critical.length
    }

    pub fn ranked_paths(&self) -> Vec<RankedPath> {
        self.current_snapshot().ranked.paths.clone()
    }

    /// Every item transitively waiting on `item`. Empty for unknown items.
    pub fn blocked_set(&self, item: impl AsRef<str>) -> BTreeSet<ItemId> {
        match ItemId::parse(item) {
            Ok(id) => blocked::blocked_by(&self.graph_view(), &id),
            Err(_) => BTreeSet::new(),
        }
    }

    /// Every item `item` transitively waits on. Empty for unknown items.
    pub fn dependency_closure(&self, item: impl AsRef<str>) -> BTreeSet<ItemId> {
        match ItemId::parse(item) {
            Ok(id) => blocked::dependency_closure(&self.graph_view(), &id),
            Err(_) => BTreeSet::new(),
        }
    }

    pub fn direct_dependents(&self, item: impl AsRef<str>) -> Vec<ItemId> {
        match ItemId::parse(item) {
            Ok(id) => self.graph_view().neighbors(&id, Direction::Dependents),
            Err(_) => Vec::new(),
        }
    }

    pub fn first_active_on_critical_path(&self) -> Option<ItemId> {
        self.current_snapshot().first_active.clone()
    }

    /// Heaviest path ending at `item`, read from the current graph view.
    pub fn critical_path_to(&self, item: impl AsRef<str>) -> Path {
        match ItemId::parse(item) {
            Ok(id) => report::critical_path_to(&self.graph_view(), &id),
            Err(_) => Path::new(),
        }
    }

    /// Items on the primary critical path marked `blocked` at the last
    /// recompute.
    pub fn critical_blockers(&self) -> Vec<ItemId> {
        self.current_snapshot().blocked_on_path.clone()
    }

    pub fn estimated_finish_offsets(&self) -> BTreeMap<ItemId, Weight> {
        self.current_snapshot().finish_offsets.clone()
    }

    pub fn estimated_completion_dates(&self, start: NaiveDate) -> BTreeMap<ItemId, NaiveDate> {
        self.current_snapshot().completion_dates(start)
    }

    /// Not-done items with more than one direct dependent, by impact.
    pub fn bottlenecks(&self) -> Vec<Bottleneck> {
        let directory = Arc::clone(&self.directory);
        blocked::bottlenecks(&self.graph_view(), |id| directory.item_status(id))
    }

    pub fn item_report(&self, item: impl AsRef<str>) -> Option<ItemReport> {
        let id = ItemId::parse(item).ok()?;
        report::item_report(&self.graph_view(), &self.current_snapshot(), &id)
    }

    pub fn blocker_report(&self) -> Option<BlockerReport> {
        report::blocker_report(&self.graph_view(), &self.current_snapshot())
    }
}
