// src/config/mod.rs

//! Graph file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a graph file from disk (`loader.rs`).
//! - Validate items, dependencies and acyclicity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_GRAPH_FILE, default_graph_path, load_and_validate, load_from_path};
pub use model::{DependencyConfig, EngineSection, GraphFile, ItemConfig, RawGraphFile};
