// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::ItemId;

#[derive(Error, Debug)]
pub enum CritpathError {
    #[error("Dependency {dependent} -> {dependency} would create a cycle")]
    Cycle { dependent: ItemId, dependency: ItemId },

    #[error("Unknown item: {0}")]
    UnknownNode(ItemId),

    #[error("Dependency not found: {dependent} -> {dependency}")]
    NotFound { dependent: ItemId, dependency: ItemId },

    #[error("Item not tracked by the graph: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid item id: {0:?}")]
    InvalidItemId(String),

    #[error("Cycle detected in dependency graph: {0}")]
    CycleDetected(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Engine is no longer running")]
    EngineStopped,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CritpathError>;
