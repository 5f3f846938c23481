// src/lib.rs

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dag;
pub mod directory;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::analysis::PathSnapshot;
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::GraphFile;
use crate::engine::Engine;

pub use crate::directory::{InMemoryDirectory, ItemDirectory};
pub use crate::errors::CritpathError;
pub use crate::types::{GraphVersion, ItemId, ItemStatus, Weight};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - graph file loading
/// - an in-memory item directory built from the file
/// - the engine, fed with every item and dependency through its mutation path
/// - a single flushed snapshot printed as a report
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.graph)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let directory = Arc::new(cfg.directory());
    let (engine, join) = Engine::spawn(directory, cfg.settings());

    for id in cfg.item.keys() {
        engine.track_item(id).await?;
    }
    for dep in &cfg.dependency {
        engine
            .add_dependency(&dep.dependent, &dep.dependency, dep.kind.as_str(), dep.actor.as_str())
            .await?;
    }
    info!(
        items = cfg.item.len(),
        dependencies = cfg.dependency.len(),
        "graph loaded into engine"
    );

    let snapshot = engine.flush().await?;
    print_report(&engine, &snapshot, &args);

    engine.shutdown().await?;
    join.await??;
    Ok(())
}

fn join_path(path: &[ItemId]) -> String {
    path.iter().map(ItemId::as_str).collect::<Vec<_>>().join(" -> ")
}

fn print_report(engine: &Engine, snapshot: &PathSnapshot, args: &CliArgs) {
    println!(
        "critical length: {} ({} path(s), graph {})",
        snapshot.critical.length,
        snapshot.critical.paths.len(),
        snapshot.graph_version
    );
    for path in &snapshot.critical.paths {
        println!("  {}", join_path(path));
    }
    println!();

    println!("ranked paths ({:?}):", snapshot.ranked.mode);
    for ranked in &snapshot.ranked.paths {
        let marker = if ranked.is_critical { " *" } else { "" };
        println!(
            "  [slack {:>3}] length {:>3}  {}{marker}",
            ranked.slack,
            ranked.length,
            join_path(&ranked.path)
        );
    }
    println!();

    match &snapshot.first_active {
        Some(item) => println!("first active on critical path: {item}"),
        None => println!("first active on critical path: none"),
    }
    if !snapshot.blocked_on_path.is_empty() {
        let names: Vec<&str> = snapshot.blocked_on_path.iter().map(ItemId::as_str).collect();
        println!("blocked on critical path: {names:?}");
    }
    if !snapshot.finish_offsets.is_empty() {
        println!("estimated finish (weight units from now):");
        for (item, offset) in &snapshot.finish_offsets {
            println!("  {item}: {offset}");
        }
    }

    let bottlenecks = engine.bottlenecks();
    if !bottlenecks.is_empty() {
        println!("bottlenecks:");
        for b in bottlenecks {
            println!(
                "  {} blocks {} item(s) ({} directly)",
                b.item,
                b.impact,
                b.direct_dependents.len()
            );
        }
    }

    for id in &args.blocked {
        let blocked = engine.blocked_set(id);
        let names: Vec<&str> = blocked.iter().map(ItemId::as_str).collect();
        println!("blocked by {id}: {names:?}");
    }

    if let Some(id) = &args.item {
        match engine.item_report(id) {
            Some(report) => {
                println!("item {}:", report.item);
                println!("  on critical path: {}", report.on_critical_path);
                if let Some(position) = report.position {
                    println!("  position: {position}");
                }
                if let Some(float) = report.float {
                    println!("  float: {float}");
                }
                println!("  direct dependencies: {:?}", report.direct_dependencies);
                println!("  indirect dependencies: {:?}", report.indirect_dependencies);
                println!("  longest chain: {}", join_path(&engine.critical_path_to(id)));
            }
            None => println!("item {id}: not tracked"),
        }
    }

    debug!(sequence = snapshot.sequence, "report printed");
}

/// Simple dry-run output: print engine settings, items and dependencies.
fn print_dry_run(cfg: &GraphFile) {
    println!("critpath dry-run");
    println!("  engine.debounce_ms = {}", cfg.engine.debounce_ms);
    println!("  engine.max_paths = {}", cfg.engine.max_paths);
    println!();

    println!("items ({}):", cfg.item.len());
    for (id, item) in &cfg.item {
        println!("  - {id} (weight {}, {})", item.weight, item.status);
    }
    println!();

    println!("dependencies ({}):", cfg.dependency.len());
    for dep in &cfg.dependency {
        println!(
            "  - {} waits on {} [{}, by {}]",
            dep.dependent, dep.dependency, dep.kind, dep.actor
        );
    }

    debug!("dry-run complete (engine not started)");
}
