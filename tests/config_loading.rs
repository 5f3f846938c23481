mod common;

use std::time::Duration;

use critpath::cli::CliArgs;
use critpath::config::{GraphFile, load_and_validate, load_from_path};
use critpath::errors::CritpathError;
use critpath::{ItemDirectory, ItemStatus, run};
use critpath_test_utils::builders::write_graph_file;
use tempfile::tempdir;

use crate::common::{GraphFileBuilder, id, init_tracing, samples};

const FAN_IN_TOML: &str = r#"
[engine]
debounce_ms = 5
max_paths = 32

[item.901]
status = "done"

[item.902]
weight = 2

[item.903]
[item.904]
[item.906]
[item.907]
[item.909]

[[dependency]]
dependent = "902"
dependency = "901"

[[dependency]]
dependent = "903"
dependency = "902"

[[dependency]]
dependent = "906"
dependency = "903"

[[dependency]]
dependent = "904"
dependency = "901"
kind = "relates"
actor = "import"

[[dependency]]
dependent = "907"
dependency = "904"

[[dependency]]
dependent = "909"
dependency = "906"

[[dependency]]
dependent = "909"
dependency = "907"
"#;

fn args_for(path: &std::path::Path) -> CliArgs {
    CliArgs {
        graph: path.display().to_string(),
        log_level: None,
        blocked: vec!["904".to_string()],
        item: Some("903".to_string()),
        dry_run: false,
    }
}

#[test]
fn loads_graph_file_with_defaults() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = write_graph_file(dir.path(), FAN_IN_TOML).unwrap();

    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.item.len(), samples::FAN_IN_ITEMS.len());
    assert_eq!(cfg.dependency.len(), samples::FAN_IN_EDGES.len());
    assert_eq!(cfg.item[&id("901")].status, ItemStatus::Done);
    assert_eq!(cfg.item[&id("901")].weight, 1);
    assert_eq!(cfg.item[&id("902")].weight, 2);
    assert_eq!(cfg.item[&id("903")].status, ItemStatus::NotStarted);
    assert_eq!(ItemStatus::default(), ItemStatus::NotStarted);

    assert_eq!(cfg.dependency[0].kind, "blocks");
    assert_eq!(cfg.dependency[0].actor, "config");
    assert_eq!(cfg.dependency[3].kind, "relates");
    assert_eq!(cfg.dependency[3].actor, "import");

    let settings = cfg.settings();
    assert_eq!(settings.debounce, Duration::from_millis(5));
    assert_eq!(settings.max_paths, 32);
}

#[test]
fn engine_section_is_optional() {
    let dir = tempdir().unwrap();
    let path = write_graph_file(dir.path(), "[item.A]\n").unwrap();

    let cfg = load_and_validate(&path).unwrap();

    assert_eq!(cfg.engine.debounce_ms, 50);
    assert_eq!(cfg.engine.max_paths, 256);
    assert!(cfg.dependency.is_empty());
}

#[test]
fn rejects_cycles() {
    let raw = GraphFileBuilder::new()
        .with_item("A", 1)
        .with_item("B", 1)
        .with_item("C", 1)
        .with_dependency("B", "A")
        .with_dependency("C", "B")
        .with_dependency("A", "C")
        .build_raw();

    let err = GraphFile::try_from(raw).unwrap_err();
    assert!(matches!(err, CritpathError::CycleDetected(_)), "got {err:?}");
}

#[test]
fn rejects_undeclared_items() {
    let raw = GraphFileBuilder::new()
        .with_item("A", 1)
        .with_dependency("A", "ghost")
        .build_raw();

    match GraphFile::try_from(raw) {
        Err(CritpathError::ConfigError(msg)) => assert!(msg.contains("ghost"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn rejects_self_dependency() {
    let raw = GraphFileBuilder::new()
        .with_item("A", 1)
        .with_dependency("A", "A")
        .build_raw();

    assert!(matches!(
        GraphFile::try_from(raw),
        Err(CritpathError::ConfigError(_))
    ));
}

#[test]
fn rejects_empty_graph_and_zero_max_paths() {
    assert!(matches!(
        GraphFile::try_from(GraphFileBuilder::new().build_raw()),
        Err(CritpathError::ConfigError(_))
    ));

    let raw = GraphFileBuilder::new()
        .with_item("A", 1)
        .with_max_paths(0)
        .build_raw();
    assert!(matches!(
        GraphFile::try_from(raw),
        Err(CritpathError::ConfigError(_))
    ));
}

#[test]
fn reports_toml_and_io_errors() {
    let dir = tempdir().unwrap();

    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_from_path(&missing),
        Err(CritpathError::IoError(_))
    ));

    let path = write_graph_file(dir.path(), "[item.A]\nweight = \"heavy\"\n").unwrap();
    assert!(matches!(
        load_from_path(&path),
        Err(CritpathError::TomlError(_))
    ));

    let path = write_graph_file(dir.path(), "[item.A]\nstatus = \"sleeping\"\n").unwrap();
    assert!(matches!(
        load_from_path(&path),
        Err(CritpathError::TomlError(_))
    ));
}

#[test]
fn directory_reflects_declared_items() {
    let cfg = GraphFileBuilder::new()
        .with_item_status("A", 3, ItemStatus::InProgress)
        .with_item("B", 1)
        .with_dependency("B", "A")
        .build();

    let directory = cfg.directory();

    assert!(directory.item_exists(&id("A")));
    assert_eq!(directory.item_status(&id("A")), Some(ItemStatus::InProgress));
    assert_eq!(directory.item_estimate(&id("A")), Some(3));
    assert!(!directory.item_exists(&id("C")));
}

#[tokio::test]
async fn run_loads_graph_and_reports() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = write_graph_file(dir.path(), FAN_IN_TOML).unwrap();

    run(args_for(&path)).await.unwrap();

    let mut dry = args_for(&path);
    dry.dry_run = true;
    run(dry).await.unwrap();
}

#[tokio::test]
async fn run_fails_on_invalid_graph() {
    let dir = tempdir().unwrap();
    let path = write_graph_file(
        dir.path(),
        "[item.A]\n[item.B]\n[[dependency]]\ndependent = \"A\"\ndependency = \"C\"\n",
    )
    .unwrap();

    assert!(run(args_for(&path)).await.is_err());
}
