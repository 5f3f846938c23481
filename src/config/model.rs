// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::directory::InMemoryDirectory;
use crate::engine::{DEFAULT_DEBOUNCE, DEFAULT_MAX_PATHS, EngineSettings};
use crate::types::{DEFAULT_EDGE_KIND, DEFAULT_WEIGHT, ItemId, ItemStatus, Weight};

/// Graph file as read from TOML, before validation.
///
/// ```toml
/// [engine]
/// debounce_ms = 50
/// max_paths = 256
///
/// [item.901]
/// weight = 2
/// status = "done"
///
/// [[dependency]]
/// dependent = "902"
/// dependency = "901"
/// ```
///
/// All sections are optional at parse time; validation requires at least
/// one item.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGraphFile {
    #[serde(default)]
    pub engine: EngineSection,

    /// Keys are item ids.
    #[serde(default)]
    pub item: BTreeMap<ItemId, ItemConfig>,

    /// `[[dependency]]` array of tables, applied in file order.
    #[serde(default)]
    pub dependency: Vec<DependencyConfig>,
}

/// Validated graph file.
///
/// Same shape as [`RawGraphFile`], but only obtainable through
/// `GraphFile::try_from`, so holders can rely on the checks in
/// `config::validate`.
#[derive(Debug, Clone)]
pub struct GraphFile {
    pub engine: EngineSection,
    pub item: BTreeMap<ItemId, ItemConfig>,
    pub dependency: Vec<DependencyConfig>,
}

impl GraphFile {
    pub(crate) fn new_unchecked(
        engine: EngineSection,
        item: BTreeMap<ItemId, ItemConfig>,
        dependency: Vec<DependencyConfig>,
    ) -> Self {
        Self {
            engine,
            item,
            dependency,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        EngineSettings::from(&self.engine)
    }

    /// Directory holding every declared item with its status and weight.
    pub fn directory(&self) -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        for (id, item) in &self.item {
            directory.insert(id.clone(), item.status, Some(item.weight));
        }
        directory
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct EngineSection {
    /// Debounce window in milliseconds; 0 recomputes on the next loop turn.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

fn default_max_paths() -> usize {
    DEFAULT_MAX_PATHS
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_paths: default_max_paths(),
        }
    }
}

impl From<&EngineSection> for EngineSettings {
    fn from(section: &EngineSection) -> Self {
        Self {
            debounce: Duration::from_millis(section.debounce_ms),
            max_paths: section.max_paths,
        }
    }
}

/// `[item.<id>]` section.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ItemConfig {
    #[serde(default = "default_weight")]
    pub weight: Weight,

    #[serde(default)]
    pub status: ItemStatus,
}

fn default_weight() -> Weight {
    DEFAULT_WEIGHT
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            weight: DEFAULT_WEIGHT,
            status: ItemStatus::default(),
        }
    }
}

/// One `[[dependency]]` entry: `dependent` waits on `dependency`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DependencyConfig {
    pub dependent: ItemId,
    pub dependency: ItemId,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_kind() -> String {
    DEFAULT_EDGE_KIND.to_string()
}

fn default_actor() -> String {
    "config".to_string()
}
