#![allow(dead_code)]

use std::time::Duration;

use critpath::InMemoryDirectory;
use critpath::analysis::{PathSnapshot, compute_snapshot};
use critpath::dag::DependencyGraph;
use critpath::engine::EngineSettings;

pub use critpath_test_utils::builders::{DirectoryBuilder, GraphBuilder, GraphFileBuilder};
pub use critpath_test_utils::{id, init_tracing, path, samples, with_timeout};

pub fn settings(debounce_ms: u64, max_paths: usize) -> EngineSettings {
    EngineSettings {
        debounce: Duration::from_millis(debounce_ms),
        max_paths,
    }
}

/// Recompute `graph` directly, with every item treated as not done.
pub fn snapshot_of(graph: &DependencyGraph, max_paths: usize) -> PathSnapshot {
    compute_snapshot(graph, &InMemoryDirectory::new(), max_paths)
        .expect("sample graphs are acyclic")
}
