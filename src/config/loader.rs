// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{GraphFile, RawGraphFile};
use crate::errors::Result;

/// Load a graph file from a given path and return the raw `RawGraphFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (undeclared items, cycles, etc.). Use [`load_and_validate`] for
/// that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawGraphFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawGraphFile = toml::from_str(&contents)?;
    debug!(
        path = %path.display(),
        items = raw.item.len(),
        dependencies = raw.dependency.len(),
        "parsed graph file"
    );

    Ok(raw)
}

/// Load a graph file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Checks for:
///   - at least one item,
///   - undeclared or self-referencing dependency endpoints,
///   - dependency cycles,
///   - `[engine]` sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<GraphFile> {
    let raw = load_from_path(&path)?;
    GraphFile::try_from(raw)
}

/// `Critpath.toml` in the current working directory.
pub fn default_graph_path() -> PathBuf {
    PathBuf::from(DEFAULT_GRAPH_FILE)
}

pub const DEFAULT_GRAPH_FILE: &str = "Critpath.toml";
