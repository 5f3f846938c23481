// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{GraphFile, RawGraphFile};
use crate::errors::{CritpathError, Result};

impl TryFrom<RawGraphFile> for GraphFile {
    type Error = CritpathError;

    fn try_from(raw: RawGraphFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_graph(&raw)?;
        Ok(GraphFile::new_unchecked(raw.engine, raw.item, raw.dependency))
    }
}

fn validate_raw_graph(cfg: &RawGraphFile) -> Result<()> {
    ensure_has_items(cfg)?;
    validate_engine_section(cfg)?;
    validate_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_items(cfg: &RawGraphFile) -> Result<()> {
    if cfg.item.is_empty() {
        return Err(CritpathError::ConfigError(
            "graph file must contain at least one [item.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_engine_section(cfg: &RawGraphFile) -> Result<()> {
    if cfg.engine.max_paths == 0 {
        return Err(CritpathError::ConfigError(
            "[engine].max_paths must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_dependencies(cfg: &RawGraphFile) -> Result<()> {
    for dep in &cfg.dependency {
        for endpoint in [&dep.dependent, &dep.dependency] {
            if !cfg.item.contains_key(endpoint) {
                return Err(CritpathError::ConfigError(format!(
                    "dependency {} -> {} references undeclared item '{}'",
                    dep.dependent, dep.dependency, endpoint
                )));
            }
        }
        if dep.dependent == dep.dependency {
            return Err(CritpathError::ConfigError(format!(
                "item '{}' cannot depend on itself",
                dep.dependent
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawGraphFile) -> Result<()> {
    // Edge direction: dependency -> dependent, so a topological order lists
    // prerequisites first.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in cfg.item.keys() {
        graph.add_node(id.as_str());
    }

    for dep in &cfg.dependency {
        graph.add_edge(dep.dependency.as_str(), dep.dependent.as_str(), ());
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(CritpathError::CycleDetected(format!(
            "dependency cycle involving item '{}'",
            cycle.node_id()
        ))),
    }
}
