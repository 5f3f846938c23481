mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use critpath::engine::Engine;
use critpath::errors::CritpathError;
use critpath::{GraphVersion, InMemoryDirectory, ItemStatus};

use crate::common::{DirectoryBuilder, id, init_tracing, path, samples, settings, with_timeout};

async fn load_fan_in(engine: &Engine) {
    for (dependent, dependency) in samples::FAN_IN_EDGES {
        engine
            .add_dependency(dependent, dependency, "blocks", "test")
            .await
            .unwrap();
    }
}

fn fan_in_directory() -> Arc<InMemoryDirectory> {
    DirectoryBuilder::new().items(&samples::FAN_IN_ITEMS).build()
}

#[tokio::test(start_paused = true)]
async fn burst_of_mutations_publishes_one_snapshot() {
    init_tracing();
    let directory = DirectoryBuilder::new().items(&["A", "B", "C", "D", "E"]).build();
    let (engine, _join) = Engine::spawn(directory, settings(50, 64));
    let mut snapshots = engine.subscribe();

    let mut versions: Vec<GraphVersion> = Vec::new();
    for (dependent, dependency) in [("B", "A"), ("C", "B"), ("D", "C"), ("E", "D")] {
        let version = engine
            .add_dependency(dependent, dependency, "blocks", "test")
            .await
            .unwrap();
        versions.push(version);
    }
    let last = *versions.last().unwrap();
    assert!(versions.windows(2).all(|w| w[0] < w[1]));

    snapshots.changed().await.unwrap();
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.sequence, 1);
    assert_eq!(snapshot.graph_version, last);
    assert_eq!(snapshot.critical.length, 5);

    // Nothing else is pending, so nothing else is published.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!snapshots.has_changed().unwrap());
    assert_eq!(engine.current_snapshot().sequence, 1);
}

#[tokio::test]
async fn flush_does_not_wait_for_debounce() {
    init_tracing();
    // A ten-second window would trip the five-second timeout.
    let (engine, _join) = Engine::spawn(fan_in_directory(), settings(10_000, 64));

    let snapshot = with_timeout(async {
        load_fan_in(&engine).await;
        engine.flush().await.unwrap()
    })
    .await;

    assert_eq!(snapshot.critical.length, 5);
    assert_eq!(
        engine.critical_path().paths,
        vec![path(&["901", "902", "903", "906", "909"])]
    );
    let ranked = engine.ranked_paths();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[1].path, path(&["901", "904", "907", "909"]));
    assert_eq!(ranked[1].slack, 1);
    assert!(!ranked[1].is_critical);
}

#[tokio::test]
async fn flush_on_fresh_engine_returns_empty_snapshot() {
    let (engine, _join) = Engine::spawn(fan_in_directory(), settings(50, 64));
    let snapshot = with_timeout(engine.flush()).await.unwrap();
    assert_eq!(snapshot.sequence, 0);
    assert!(snapshot.critical.is_empty());
}

#[tokio::test]
async fn rejected_mutations_leave_graph_view_unchanged() {
    let (engine, _join) = Engine::spawn(fan_in_directory(), settings(0, 64));
    load_fan_in(&engine).await;
    let before = engine.graph_view();

    let err = engine
        .add_dependency("901", "909", "blocks", "test")
        .await
        .unwrap_err();
    assert!(matches!(err, CritpathError::Cycle { .. }), "got {err:?}");

    let err = engine
        .add_dependency("901", "unknown", "blocks", "test")
        .await
        .unwrap_err();
    assert!(matches!(err, CritpathError::UnknownNode(_)), "got {err:?}");

    let err = engine.add_dependency("  ", "901", "blocks", "test").await.unwrap_err();
    assert!(matches!(err, CritpathError::InvalidItemId(_)), "got {err:?}");

    assert_eq!(*engine.graph_view(), *before);
}

#[tokio::test]
async fn removal_is_idempotent_through_engine() {
    let (engine, _join) = Engine::spawn(fan_in_directory(), settings(0, 64));
    load_fan_in(&engine).await;

    let version = engine.remove_dependency("909", "907").await.unwrap();
    let after_first = engine.graph_view();

    let err = engine.remove_dependency("909", "907").await.unwrap_err();
    assert!(matches!(err, CritpathError::NotFound { .. }));
    assert_eq!(engine.graph_view().version(), version);
    assert_eq!(*engine.graph_view(), *after_first);

    let snapshot = with_timeout(engine.flush()).await.unwrap();
    // 907 is now a sink of its own.
    assert!(snapshot.sinks.contains(&id("907")));
}

#[tokio::test]
async fn blocked_set_and_closure_queries() {
    let (engine, _join) = Engine::spawn(fan_in_directory(), settings(0, 64));
    load_fan_in(&engine).await;

    assert_eq!(
        engine.blocked_set("904"),
        BTreeSet::from([id("907"), id("909")])
    );
    assert!(engine.blocked_set("not-tracked").is_empty());
    assert_eq!(
        engine.dependency_closure("906"),
        BTreeSet::from([id("901"), id("902"), id("903")])
    );
    assert_eq!(engine.direct_dependents("901"), vec![id("902"), id("904")]);

    let bottlenecks = engine.bottlenecks();
    assert_eq!(bottlenecks.len(), 1);
    assert_eq!(bottlenecks[0].item, id("901"));
}

#[tokio::test]
async fn first_active_follows_status_changes() {
    init_tracing();
    let directory = DirectoryBuilder::new()
        .item_with("A", ItemStatus::Done, None)
        .items(&["B", "C"])
        .build();
    let (engine, _join) = Engine::spawn(directory.clone(), settings(0, 64));
    engine.add_dependency("B", "A", "blocks", "test").await.unwrap();
    engine.add_dependency("C", "B", "blocks", "test").await.unwrap();

    let first = with_timeout(engine.flush()).await.unwrap();
    assert_eq!(first.first_active, Some(id("B")));
    assert_eq!(engine.first_active_on_critical_path(), Some(id("B")));

    assert!(directory.set_status(&id("B"), ItemStatus::Done));
    engine.notify_status_changed("B").await.unwrap();

    let second = with_timeout(engine.flush()).await.unwrap();
    assert!(second.sequence > first.sequence);
    assert_eq!(second.graph_version, first.graph_version);
    assert_eq!(second.first_active, Some(id("C")));
    // Status never changes path lengths.
    assert_eq!(second.critical.length, first.critical.length);
}

#[tokio::test]
async fn estimates_and_weights_shape_the_critical_path() {
    let directory = DirectoryBuilder::new()
        .items(&["A", "B", "D"])
        .item_with("C", ItemStatus::NotStarted, Some(5))
        .build();
    let (engine, _join) = Engine::spawn(directory, settings(0, 64));
    for (dependent, dependency) in [("B", "A"), ("C", "A"), ("D", "B"), ("D", "C")] {
        engine.add_dependency(dependent, dependency, "blocks", "test").await.unwrap();
    }

    let snapshot = with_timeout(engine.flush()).await.unwrap();
    assert_eq!(snapshot.critical.paths, vec![path(&["A", "C", "D"])]);
    assert_eq!(snapshot.critical.length, 7);

    engine.set_weight("B", 10).await.unwrap();
    let snapshot = with_timeout(engine.flush()).await.unwrap();
    assert_eq!(snapshot.critical.paths, vec![path(&["A", "B", "D"])]);
    assert_eq!(snapshot.critical.length, 12);

    let err = engine.set_weight("missing", 3).await.unwrap_err();
    assert!(matches!(err, CritpathError::ItemNotFound(_)));
}

#[tokio::test]
async fn track_and_remove_items() {
    let (engine, _join) = Engine::spawn(fan_in_directory(), settings(0, 64));
    load_fan_in(&engine).await;

    engine.remove_item("904").await.unwrap();
    let snapshot = with_timeout(engine.flush()).await.unwrap();
    assert_eq!(snapshot.ranked.paths.len(), 2);
    assert!(snapshot.sources.contains(&id("907")));
    assert!(!engine.graph_view().contains(&id("904")));

    engine.track_item("904").await.unwrap();
    assert!(engine.graph_view().contains(&id("904")));
    assert_eq!(engine.graph_view().in_degree(&id("904")), 0);

    let err = engine.track_item("ghost").await.unwrap_err();
    assert!(matches!(err, CritpathError::UnknownNode(_)));
}

#[tokio::test]
async fn item_and_blocker_reports() {
    let (engine, _join) = Engine::spawn(fan_in_directory(), settings(0, 64));
    load_fan_in(&engine).await;
    with_timeout(engine.flush()).await.unwrap();

    let report = engine.item_report("903").unwrap();
    assert!(report.on_critical_path);
    assert_eq!(report.position, Some(3));
    assert_eq!(report.float, Some(0));
    assert_eq!(report.direct_dependencies, vec![id("902")]);
    assert_eq!(report.indirect_dependencies, vec![id("901")]);

    let report = engine.item_report("907").unwrap();
    assert!(!report.on_critical_path);
    assert_eq!(report.position, None);
    assert_eq!(report.float, Some(1));

    assert!(engine.item_report("missing").is_none());

    let blocker = engine.blocker_report().unwrap();
    assert_eq!(blocker.item, id("901"));
    assert_eq!(blocker.directly_blocks, vec![id("902"), id("904")]);
    assert_eq!(blocker.total_impact.len(), 6);
}

#[tokio::test]
async fn schedule_queries_read_statuses_and_estimates() {
    let directory = DirectoryBuilder::new()
        .item_with("A", ItemStatus::Done, None)
        .item_with("B", ItemStatus::InProgress, Some(3))
        .item_with("C", ItemStatus::NotStarted, Some(2))
        .item("D")
        .build();
    let (engine, _join) = Engine::spawn(directory.clone(), settings(0, 64));
    for (dependent, dependency) in [("B", "A"), ("C", "B"), ("D", "A")] {
        engine.add_dependency(dependent, dependency, "blocks", "test").await.unwrap();
    }

    with_timeout(engine.flush()).await.unwrap();
    assert_eq!(engine.critical_path_to("C"), path(&["A", "B", "C"]));
    assert_eq!(engine.critical_path_to("D"), path(&["A", "D"]));
    assert!(engine.critical_path_to("ghost").is_empty());
    assert!(engine.critical_blockers().is_empty());
    assert_eq!(
        engine.estimated_finish_offsets().into_iter().collect::<Vec<_>>(),
        vec![(id("B"), 3), (id("C"), 5)]
    );

    assert!(directory.set_status(&id("C"), ItemStatus::Blocked));
    engine.notify_status_changed("C").await.unwrap();
    with_timeout(engine.flush()).await.unwrap();
    assert_eq!(engine.critical_blockers(), vec![id("C")]);

    let start = chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let dates = engine.estimated_completion_dates(start);
    assert_eq!(dates[&id("C")], chrono::NaiveDate::from_ymd_opt(2026, 3, 6).unwrap());
}

#[tokio::test]
async fn shutdown_stops_engine() {
    let (engine, join) = Engine::spawn(fan_in_directory(), settings(0, 64));
    load_fan_in(&engine).await;

    engine.shutdown().await.unwrap();
    with_timeout(join).await.unwrap().unwrap();

    let err = engine
        .add_dependency("909", "901", "blocks", "test")
        .await
        .unwrap_err();
    assert!(matches!(err, CritpathError::EngineStopped));
    assert!(matches!(engine.flush().await, Err(CritpathError::EngineStopped)));

    // Readers keep the last published views.
    assert_eq!(engine.graph_view().edge_count(), 7);
}

#[tokio::test]
async fn dropping_every_handle_ends_the_runtime() {
    let (engine, join) = Engine::spawn(fan_in_directory(), settings(0, 64));
    let other = engine.clone();
    drop(engine);
    drop(other);

    with_timeout(join).await.unwrap().unwrap();
}
