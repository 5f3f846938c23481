// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::analysis::PathSnapshot;
use crate::dag::DependencyGraph;
use crate::errors::Result;
use crate::types::GraphVersion;

use super::core::CoordinatorCore;
use super::event_handlers::RecomputeJob;
use super::{CoordinatorEvent, CoreCommand, CoreStep, GraphMutation};

/// Requests sent from [`Engine`](super::Engine) handles to the runtime.
#[derive(Debug)]
pub(crate) enum EngineRequest {
    Mutate {
        mutation: GraphMutation,
        reply: oneshot::Sender<Result<GraphVersion>>,
    },
    StatusChanged(crate::types::ItemId),
    Flush(oneshot::Sender<Arc<PathSnapshot>>),
    Shutdown,
}

type RecomputeOutcome = std::result::Result<PathSnapshot, String>;

/// Drives the coordinator core in response to engine requests, debounce
/// deadlines and finished recompute jobs.
///
/// This is a pure IO shell around `CoordinatorCore`, which contains all the
/// recompute semantics. This struct owns the channels, the deadline and the
/// flush waiters.
pub struct Runtime {
    core: CoordinatorCore,
    requests: mpsc::Receiver<EngineRequest>,
    recompute_tx: mpsc::Sender<RecomputeOutcome>,
    recompute_rx: mpsc::Receiver<RecomputeOutcome>,
    graph_tx: watch::Sender<Arc<DependencyGraph>>,
    snapshot_tx: watch::Sender<Arc<PathSnapshot>>,
    flush_waiters: Vec<oneshot::Sender<Arc<PathSnapshot>>>,
    debounce: Duration,
    deadline: Option<Instant>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("deadline", &self.deadline)
            .field("flush_waiters", &self.flush_waiters.len())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub(crate) fn new(
        core: CoordinatorCore,
        debounce: Duration,
        requests: mpsc::Receiver<EngineRequest>,
        graph_tx: watch::Sender<Arc<DependencyGraph>>,
        snapshot_tx: watch::Sender<Arc<PathSnapshot>>,
    ) -> Self {
        let (recompute_tx, recompute_rx) = mpsc::channel(4);
        Self {
            core,
            requests,
            recompute_tx,
            recompute_rx,
            graph_tx,
            snapshot_tx,
            flush_waiters: Vec::new(),
            debounce,
            deadline: None,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes engine requests, recompute results and the debounce deadline.
    /// - Feeds them into the core.
    /// - Executes commands returned by the core (publish, arm timer, spawn
    ///   recompute, answer flushes).
    ///
    /// Returns when every engine handle is dropped or shutdown is requested.
    pub async fn run(mut self) -> Result<()> {
        info!("critpath engine started");

        let startup = self.core.start();
        self.execute_step(startup);

        loop {
            let deadline = self.deadline;
            let step = tokio::select! {
                request = self.requests.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => {
                        info!("all engine handles dropped; exiting");
                        break;
                    }
                },
                Some(outcome) = self.recompute_rx.recv() => {
                    let event = match outcome {
                        Ok(snapshot) => CoordinatorEvent::RecomputeFinished(Box::new(snapshot)),
                        Err(reason) => CoordinatorEvent::RecomputeFailed(reason),
                    };
                    self.core.step(event)
                }
                () = wait_for(deadline) => {
                    self.deadline = None;
                    self.core.step(CoordinatorEvent::DebounceElapsed)
                }
            };

            if !self.execute_step(step) {
                info!("shutdown requested; stopping engine");
                break;
            }
        }

        if !self.flush_waiters.is_empty() {
            warn!(waiters = self.flush_waiters.len(), "dropping unanswered flush requests");
        }
        info!("engine exiting");
        Ok(())
    }

    fn handle_request(&mut self, request: EngineRequest) -> CoreStep {
        debug!(?request, "engine received request");
        match request {
            EngineRequest::Mutate { mutation, reply } => {
                let (result, mut step) = self.core.apply(mutation);
                // Readers see the new graph before the caller hears back.
                for command in std::mem::take(&mut step.commands) {
                    self.execute_command(command);
                }
                // The caller may have given up waiting; the mutation stands.
                let _ = reply.send(result);
                step
            }
            EngineRequest::StatusChanged(item) => {
                self.core.step(CoordinatorEvent::StatusChanged { item })
            }
            EngineRequest::Flush(reply) => {
                self.flush_waiters.push(reply);
                self.core.step(CoordinatorEvent::FlushRequested)
            }
            EngineRequest::Shutdown => self.core.step(CoordinatorEvent::ShutdownRequested),
        }
    }

    /// Returns the step's `keep_running`.
    fn execute_step(&mut self, step: CoreStep) -> bool {
        for command in step.commands {
            self.execute_command(command);
        }
        step.keep_running
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::PublishGraph(graph) => {
                self.graph_tx.send_replace(graph);
            }
            CoreCommand::ArmDebounce => {
                self.deadline = Some(Instant::now() + self.debounce);
            }
            CoreCommand::CancelDebounce => {
                self.deadline = None;
            }
            CoreCommand::StartRecompute(job) => self.spawn_recompute(job),
            CoreCommand::PublishSnapshot(snapshot) => {
                self.snapshot_tx.send_replace(snapshot);
            }
            CoreCommand::ResolveFlush(snapshot) => {
                for waiter in self.flush_waiters.drain(..) {
                    let _ = waiter.send(Arc::clone(&snapshot));
                }
            }
        }
    }

    fn spawn_recompute(&self, job: RecomputeJob) {
        debug!(?job, "spawning recompute");
        let tx = self.recompute_tx.clone();
        tokio::spawn(async move {
            let outcome = match tokio::task::spawn_blocking(move || job.run()).await {
                Ok(result) => result.map_err(|err| err.to_string()),
                Err(join) => Err(format!("recompute task aborted: {join}")),
            };
            let _ = tx.send(outcome).await;
        });
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
