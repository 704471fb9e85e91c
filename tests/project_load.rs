// tests/project_load.rs

use std::error::Error;
use std::sync::Arc;

use chrono::NaiveDate;
use plandag::errors::GraphError;
use plandag::project::ProjectGraph;
use plandag::store::{MemoryStore, ProjectStore, StoreError};
use plandag::types::{EntityKind, Location};
use plandag_test_utils::builders::{
    after_end, delay, delay_relation, diamond_tasks, modifier, project, relation, task, ymd,
};
use plandag_test_utils::flaky_store::FlakyStore;
use plandag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Persist the diamond directly through the store, with the join edges
/// written before the fan-out edges.
async fn seed_diamond(store: &MemoryStore, id: &str) -> Result<(), StoreError> {
    store.add_project(project(id)).await?;
    for t in diamond_tasks() {
        store.add_task(id, t).await?;
    }
    store.add_task_relation(id, after_end("C", "D")).await?;
    store.add_task_relation(id, after_end("B", "D")).await?;
    store.add_task_relation(id, after_end("A", "C")).await?;
    store.add_task_relation(id, after_end("A", "B")).await?;

    let m = store.add_modifier(id, modifier(2)).await?;
    store.add_modifier_for_task(id, "C", m.id).await?;

    store.add_delay(id, delay("release", ymd(2016, 12, 5))).await?;
    store
        .add_delay_relation(id, delay_relation("release", "D", 0))
        .await?;
    Ok(())
}

#[tokio::test]
async fn load_rebuilds_the_computed_schedule() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        seed_diamond(&store, "p").await?;

        let mut graph = ProjectGraph::new(Arc::new(store));
        graph.load().await?;
        assert_eq!(graph.len(), 1);

        let node = graph.project("p").expect("project loaded");
        let snap = node.snapshot();

        assert_eq!(snap.task("A").unwrap().end_date, ymd(2016, 10, 31));
        assert_eq!(snap.task("B").unwrap().end_date, ymd(2016, 11, 15));
        // C carries a +2 modifier: 2016-10-31 + 12.
        assert_eq!(snap.task("C").unwrap().duration, 12);
        assert_eq!(snap.task("C").unwrap().end_date, ymd(2016, 11, 12));
        assert_eq!(snap.task("D").unwrap().start_date, ymd(2016, 11, 15));
        assert_eq!(snap.task("D").unwrap().end_date, ymd(2016, 11, 30));

        let release = snap.delay("release").unwrap();
        assert_eq!(release.margin, Some(5));
        assert_eq!(release.initial_margin, Some(5));

        let d = node.task("D").unwrap();
        assert_eq!(d.parents().len(), 2);
        assert_eq!(d.delays(), ["release".to_string()]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn loaded_schedule_matches_incrementally_built_one() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let shared: Arc<dyn ProjectStore> = Arc::new(store.clone());

        let mut live = ProjectGraph::new(Arc::clone(&shared));
        let node = live.add_project(project("p")).await?;
        for t in diamond_tasks() {
            node.add_task(t).await?;
        }
        node.add_task_relation(after_end("A", "B")).await?;
        node.add_modifier("B", modifier(4)).await?;
        node.add_task_relation(after_end("B", "D")).await?;
        node.add_task_relation(after_end("A", "C")).await?;
        node.add_task_relation(after_end("C", "D")).await?;
        node.add_modifier("A", modifier(-2)).await?;
        let expected = node.snapshot();

        let mut reloaded = ProjectGraph::new(shared);
        reloaded.load().await?;
        let actual = reloaded.project("p").unwrap().snapshot();

        assert_eq!(expected.tasks, actual.tasks);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn one_failing_project_fails_the_whole_load() -> TestResult {
    with_timeout(async {
        init_tracing();

        let inner = MemoryStore::new();
        seed_diamond(&inner, "good").await?;
        seed_diamond(&inner, "bad").await?;

        let store = FlakyStore::new(inner);
        store.fail_reads_for("bad");

        let mut graph = ProjectGraph::new(Arc::new(store));
        let err = graph.load().await.unwrap_err();
        assert!(matches!(err, GraphError::Store(StoreError::Backend(_))), "got {err:?}");
        assert!(graph.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn duplicate_project_is_rejected() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut graph = ProjectGraph::new(Arc::new(MemoryStore::new()));
        graph.add_project(project("p")).await?;

        match graph.add_project(project("p")).await {
            Err(GraphError::Exists { kind, id }) => {
                assert_eq!(kind, EntityKind::Project);
                assert_eq!(id, "p");
            }
            other => panic!("expected Exists, got {other:?}"),
        }

        assert_eq!(graph.len(), 1);
        assert!(graph.project("missing").is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn mutations_validate_ids_before_persisting() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 3)).await?;
        node.add_delay(delay("d", ymd(2016, 10, 9))).await?;

        assert!(matches!(
            node.add_task(task("A", ymd(2016, 10, 2), 1)).await,
            Err(GraphError::Exists { kind: EntityKind::Task, .. })
        ));
        assert!(matches!(
            node.add_delay(delay("d", ymd(2016, 10, 9))).await,
            Err(GraphError::Exists { kind: EntityKind::Delay, .. })
        ));
        assert!(matches!(
            node.add_task_relation(after_end("A", "ghost")).await,
            Err(GraphError::NotFound { kind: EntityKind::Task, .. })
        ));
        assert!(matches!(
            node.add_delay_relation(delay_relation("nope", "A", 0)).await,
            Err(GraphError::NotFound { kind: EntityKind::Delay, .. })
        ));
        assert!(matches!(
            node.add_delay_relation(delay_relation("d", "ghost", 0)).await,
            Err(GraphError::NotFound { kind: EntityKind::Task, .. })
        ));
        assert!(matches!(
            node.add_modifier("ghost", modifier(1)).await,
            Err(GraphError::NotFound { kind: EntityKind::Task, .. })
        ));

        assert_eq!(store.get_project_tasks("p").await?.len(), 1);
        assert_eq!(store.get_project_delays("p").await?.len(), 1);
        assert!(store.get_task_relations("p", "A").await?.is_empty());
        assert!(store.get_delay_relations("p", "d").await?.is_empty());

        assert_eq!(store.get_task("p", "A").await?.estimated_duration, 3);
        assert_eq!(store.get_delay("p", "d").await?.date, ymd(2016, 10, 9));
        assert!(matches!(
            store.get_task("p", "ghost").await,
            Err(StoreError::NotFound { kind: EntityKind::Task, .. })
        ));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn rejected_cycle_is_never_persisted() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 3)).await?;
        node.add_task(task("B", ymd(2016, 10, 1), 3)).await?;
        node.add_task_relation(after_end("A", "B")).await?;

        let err = node
            .add_task_relation(after_end("B", "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::CyclicDependency(_)), "got {err:?}");

        assert!(store.get_task_relations("p", "B").await?.is_empty());
        assert!(node.task("A").unwrap().parents().is_empty());
        assert!(node.task("B").unwrap().children().is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn out_of_range_dates_are_rejected_before_persisting() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let shared: Arc<dyn ProjectStore> = Arc::new(store.clone());
        let mut graph = ProjectGraph::new(Arc::clone(&shared));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 3)).await?;
        node.add_task(task("B", ymd(2016, 10, 1), 3)).await?;

        let err = node
            .add_task(task("late", NaiveDate::MAX, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidDate(_)), "got {err:?}");

        let err = node
            .add_task_relation(relation("A", Location::End, "B", 900_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidDate(_)), "got {err:?}");

        let err = node.add_modifier("A", modifier(900_000_000)).await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidDate(_)), "got {err:?}");

        // Nothing reached the store.
        assert_eq!(store.get_project_tasks("p").await?.len(), 2);
        assert!(store.get_task_relations("p", "A").await?.is_empty());
        assert!(store.get_task_modifiers("p", "A").await?.is_empty());

        // Nothing changed in memory.
        assert!(node.task("late").is_none());
        assert!(node.task("B").unwrap().parents().is_empty());
        assert!(node.task("A").unwrap().modifiers().is_empty());
        assert_eq!(node.task("A").unwrap().duration(), 3);
        assert_eq!(node.task("B").unwrap().start_date(), ymd(2016, 10, 1));

        // The project still reloads from what was persisted.
        let mut reloaded = ProjectGraph::new(shared);
        reloaded.load().await?;
        let snap = reloaded.project("p").expect("project reloaded").snapshot();
        assert_eq!(snap.tasks.len(), 2);
        assert_eq!(snap.task("B").unwrap().start_date, ymd(2016, 10, 1));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn failed_write_leaves_the_graph_untouched() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = FlakyStore::new(MemoryStore::new());
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 3)).await?;
        node.add_task(task("B", ymd(2016, 10, 1), 3)).await?;

        store.fail_next_writes(1);
        assert!(matches!(
            node.add_task(task("C", ymd(2016, 10, 1), 3)).await,
            Err(GraphError::Store(_))
        ));
        assert!(node.task("C").is_none());

        store.fail_next_writes(1);
        assert!(node.add_task_relation(after_end("A", "B")).await.is_err());
        assert!(node.task("B").unwrap().parents().is_empty());

        store.fail_next_writes(1);
        assert!(node.add_modifier("A", modifier(5)).await.is_err());
        assert_eq!(node.task("A").unwrap().duration(), 3);
        assert!(node.task("A").unwrap().modifiers().is_empty());

        assert_eq!(store.inner().get_project_tasks("p").await?.len(), 2);
        assert!(store.inner().get_task_relations("p", "A").await?.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn modifier_ids_are_assigned_by_the_store_in_order() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 3)).await?;

        let first = node.add_modifier("A", modifier(1)).await?;
        let second = node.add_modifier("A", modifier(2)).await?;
        assert!(first.id < second.id);
        assert_eq!(node.task("A").unwrap().duration(), 6);

        let persisted = store.get_task_modifiers("p", "A").await?;
        assert_eq!(persisted, vec![first, second]);
        Ok(())
    })
    .await
}
