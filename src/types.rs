// src/types.rs

//! Core value types shared by the graph, the analysis passes and the engine.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::{CritpathError, Result};

/// Effort units carried by a node. Integer so that `slack == 0` is exact.
pub type Weight = u64;

/// Weight of an item that has no estimate.
pub const DEFAULT_WEIGHT: Weight = 1;

/// Edge kind used when the caller does not name one.
pub const DEFAULT_EDGE_KIND: &str = "blocks";

/// Opaque work-item identifier.
///
/// Validated once at the boundary (see [`ItemId::parse`]); everything inside
/// the engine treats it as an ordered, cheap-to-clone handle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Validate and wrap a raw identifier.
    ///
    /// Surrounding whitespace is trimmed; an empty result is rejected.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CritpathError::InvalidItemId(raw.as_ref().to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ItemId {
    type Error = CritpathError;

    fn try_from(value: String) -> Result<Self> {
        ItemId::parse(value)
    }
}

impl FromStr for ItemId {
    type Err = CritpathError;

    fn from_str(s: &str) -> Result<Self> {
        ItemId::parse(s)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Workflow status as reported by the work-item collaborator.
///
/// The engine never stores this; it is read when a snapshot is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
    Blocked,
}

impl ItemStatus {
    pub fn is_done(self) -> bool {
        matches!(self, ItemStatus::Done)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::NotStarted => "not-started",
            ItemStatus::InProgress => "in-progress",
            ItemStatus::Done => "done",
            ItemStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "not-started" => Ok(ItemStatus::NotStarted),
            "in-progress" => Ok(ItemStatus::InProgress),
            "done" => Ok(ItemStatus::Done),
            "blocked" => Ok(ItemStatus::Blocked),
            other => Err(format!(
                "invalid item status: {other} (expected \"not-started\", \"in-progress\", \"done\" or \"blocked\")"
            )),
        }
    }
}

/// Monotonic counter bumped by every successful graph mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GraphVersion(pub u64);

impl GraphVersion {
    pub fn next(self) -> Self {
        GraphVersion(self.0 + 1)
    }
}

impl fmt::Display for GraphVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which side of a node to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Items this node waits on.
    Dependencies,
    /// Items waiting on this node.
    Dependents,
}

/// Ordered sequence of items, dependency first.
pub type Path = Vec<ItemId>;
