// src/analysis/mod.rs

//! Path analysis on top of the dependency DAG.
//!
//! - [`critical`] computes the critical length and all critical paths.
//! - [`parallel`] ranks every (or every fan-out) path by slack and derives
//!   per-item float.
//! - [`snapshot`] runs a full recompute and packages the immutable result.
//! - [`report`] builds per-item and blocker reports from a snapshot.

pub mod critical;
pub mod parallel;
pub mod report;
pub mod snapshot;

use thiserror::Error;

pub use critical::{CriticalPath, LongestPaths};
pub use parallel::{RankedPath, RankedPaths, RankingMode};
pub use report::{BlockerReport, ItemReport};
pub use snapshot::{PathSnapshot, compute_snapshot};

/// Internal analysis signals. Never returned to engine callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("more than {limit} source-to-sink paths")]
    PathCountExceeded { limit: usize },
}
