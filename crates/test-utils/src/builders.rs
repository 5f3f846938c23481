#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use critpath::config::{DependencyConfig, EngineSection, GraphFile, ItemConfig, RawGraphFile};
use critpath::dag::DependencyGraph;
use critpath::types::{DEFAULT_EDGE_KIND, DEFAULT_WEIGHT};
use critpath::{InMemoryDirectory, ItemId, ItemStatus, Weight};

use crate::id;

/// Builder for `GraphFile` to simplify config test setup.
pub struct GraphFileBuilder {
    raw: RawGraphFile,
}

impl GraphFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawGraphFile {
                engine: EngineSection::default(),
                item: BTreeMap::new(),
                dependency: Vec::new(),
            },
        }
    }

    pub fn with_item(mut self, name: &str, weight: Weight) -> Self {
        self.raw.item.insert(
            id(name),
            ItemConfig {
                weight,
                status: ItemStatus::NotStarted,
            },
        );
        self
    }

    pub fn with_item_status(mut self, name: &str, weight: Weight, status: ItemStatus) -> Self {
        self.raw.item.insert(id(name), ItemConfig { weight, status });
        self
    }

    /// `dependent` waits on `dependency`.
    pub fn with_dependency(mut self, dependent: &str, dependency: &str) -> Self {
        self.raw.dependency.push(DependencyConfig {
            dependent: id(dependent),
            dependency: id(dependency),
            kind: DEFAULT_EDGE_KIND.to_string(),
            actor: "test".to_string(),
        });
        self
    }

    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.raw.engine.max_paths = max_paths;
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.raw.engine.debounce_ms = debounce_ms;
        self
    }

    pub fn build_raw(self) -> RawGraphFile {
        self.raw
    }

    pub fn build(self) -> GraphFile {
        GraphFile::try_from(self.raw).expect("Failed to build valid graph file from builder")
    }
}

impl Default for GraphFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for an in-memory `DependencyGraph`, bypassing the engine.
///
/// Items named only in `edge` calls get the default weight.
pub struct GraphBuilder {
    graph: DependencyGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
        }
    }

    pub fn node(mut self, name: &str, weight: Weight) -> Self {
        let item = id(name);
        if !self.graph.insert_node(item.clone(), weight) {
            self.graph
                .set_weight(&item, weight)
                .expect("node exists after insert");
        }
        self
    }

    /// `dependent` waits on `dependency`.
    pub fn edge(mut self, dependent: &str, dependency: &str) -> Self {
        for name in [dependent, dependency] {
            self.graph.insert_node(id(name), DEFAULT_WEIGHT);
        }
        self.graph
            .add_edge(&id(dependent), &id(dependency), DEFAULT_EDGE_KIND, "test")
            .expect("builder edges must keep the graph acyclic");
        self
    }

    pub fn build(self) -> DependencyGraph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the in-memory work-item directory.
pub struct DirectoryBuilder {
    directory: InMemoryDirectory,
}

impl DirectoryBuilder {
    pub fn new() -> Self {
        Self {
            directory: InMemoryDirectory::new(),
        }
    }

    pub fn item(self, name: &str) -> Self {
        self.directory.insert(id(name), ItemStatus::NotStarted, None);
        self
    }

    pub fn items(mut self, names: &[&str]) -> Self {
        for name in names {
            self = self.item(name);
        }
        self
    }

    pub fn item_with(self, name: &str, status: ItemStatus, estimate: Option<Weight>) -> Self {
        self.directory.insert(id(name), status, estimate);
        self
    }

    pub fn build(self) -> Arc<InMemoryDirectory> {
        Arc::new(self.directory)
    }
}

impl Default for DirectoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `contents` as `Critpath.toml` under `dir`.
pub fn write_graph_file(dir: &Path, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(critpath::config::DEFAULT_GRAPH_FILE);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// All ids in a slice, for directory setup.
pub fn ids(names: &[&str]) -> Vec<ItemId> {
    names.iter().map(|n| id(n)).collect()
}
