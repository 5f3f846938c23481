// src/dag/mod.rs

//! Dependency DAG representation and the queries that run directly on it.
//!
//! - [`graph`] holds the acyclic edge set and its mutation rules.
//! - [`topo`] derives the topological order plus sources and sinks.
//! - [`blocked`] answers reachability questions (blocked sets, upstream
//!   closures, bottlenecks).

pub mod blocked;
pub mod graph;
pub mod topo;

pub use blocked::{Bottleneck, blocked_by, bottlenecks, dependency_closure};
pub use graph::{DependencyGraph, Edge, EdgeInsert, EdgeMeta};
pub use topo::TopologicalOrder;
