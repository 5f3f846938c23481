// src/engine/mod.rs

//! Recompute coordination for the dependency engine.
//!
//! This module ties together:
//! - the single mutation path that owns the [`DependencyGraph`]
//! - the recompute state machine (`Idle -> PendingRecompute -> Recomputing`)
//! - debouncing of mutation bursts
//! - publication of immutable graph views and path snapshots to readers
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]; callers talk to the [`Engine`] handle in
//! [`handle`].
//!
//! [`DependencyGraph`]: crate::dag::DependencyGraph

use std::time::Duration;

use crate::analysis::PathSnapshot;
use crate::types::{ItemId, Weight};

/// Tunables for the recompute coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Quiet period after the last change before a recompute starts.
    pub debounce: Duration,
    /// Upper bound on enumerated paths before the fan-out fallback kicks in
    /// (also caps the number of tied critical paths reported).
    pub max_paths: usize,
}

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);
pub const DEFAULT_MAX_PATHS: usize = 256;

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_paths: DEFAULT_MAX_PATHS,
        }
    }
}

/// A change to the graph issued by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphMutation {
    AddDependency {
        dependent: ItemId,
        dependency: ItemId,
        kind: String,
        actor: String,
    },
    RemoveDependency {
        dependent: ItemId,
        dependency: ItemId,
    },
    /// Start tracking an item that may not have any edges yet.
    TrackItem { item: ItemId },
    RemoveItem { item: ItemId },
    SetWeight { item: ItemId, weight: Weight },
}

/// Where the coordinator is in its recompute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecomputeState {
    /// The published snapshot reflects the current graph.
    #[default]
    Idle,
    /// A change arrived; waiting for the debounce window to close.
    PendingRecompute,
    /// A recompute job is running.
    Recomputing,
}

/// Events flowing into the core besides graph mutations.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// The collaborator reported a status change for an item.
    StatusChanged { item: ItemId },
    /// The debounce window closed without further changes.
    DebounceElapsed,
    /// A caller needs an up-to-date snapshot now.
    FlushRequested,
    /// A recompute job produced a snapshot.
    RecomputeFinished(Box<PathSnapshot>),
    /// A recompute job failed; the previous snapshot stays published.
    RecomputeFailed(String),
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod handle;
pub mod runtime;

pub use self::core::CoordinatorCore;
pub use event_handlers::{CoreCommand, CoreStep, RecomputeJob, RecomputeTracker};
pub use handle::Engine;
pub use runtime::Runtime;
