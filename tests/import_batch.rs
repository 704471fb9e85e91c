// tests/import_batch.rs

use std::error::Error;
use std::sync::Arc;

use chrono::NaiveDate;
use plandag::errors::GraphError;
use plandag::project::{ImportSummary, ProjectGraph};
use plandag::store::{MemoryStore, ProjectStore};
use plandag::types::EntityKind;
use plandag_test_utils::builders::{BatchBuilder, after_end, project, task, ymd};
use plandag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn diamond_batch() -> BatchBuilder {
    BatchBuilder::new()
        .task("A", ymd(2016, 10, 1), 30)
        .task("B", ymd(2016, 10, 15), 15)
        .task("C", ymd(2016, 11, 1), 10)
        .task("D", ymd(2016, 11, 16), 15)
        .after_end("C", "D")
        .after_end("A", "B")
        .after_end("B", "D")
        .after_end("A", "C")
}

#[tokio::test]
async fn import_applies_a_whole_batch() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;

        let batch = diamond_batch()
            .delay("release", ymd(2016, 12, 5))
            .bind("release", "D", 0)
            .modifier("C", 7)
            .build();
        let summary = node.import(batch).await?;

        assert_eq!(
            summary,
            ImportSummary {
                tasks: 4,
                delays: 1,
                relations: 4,
                delay_relations: 1,
                modifiers: 1,
            }
        );

        // C: 2016-10-31 + 17 = 2016-11-17, later than B's 2016-11-15.
        let d = node.task("D").unwrap();
        assert_eq!(d.start_date(), ymd(2016, 11, 17));
        assert_eq!(d.end_date(), ymd(2016, 12, 2));

        // Bound before the modifier was applied: D then ended 2016-11-30.
        let release = node.delay("release").unwrap();
        assert_eq!(release.initial_margin(), Some(5));
        assert_eq!(release.margin(), Some(3));

        assert_eq!(store.get_project_tasks("p").await?.len(), 4);
        assert_eq!(store.get_task_modifiers("p", "C").await?.len(), 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn batch_with_internal_cycle_persists_nothing() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;

        let batch = diamond_batch().after_end("D", "A").build();
        let err = node.import(batch).await.unwrap_err();
        assert!(matches!(err, GraphError::CyclicDependency(_)), "got {err:?}");

        assert_eq!(node.tasks().count(), 0);
        assert!(store.get_project_tasks("p").await?.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn batch_with_out_of_range_dates_persists_nothing() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;

        let batch = diamond_batch().modifier("D", 900_000_000).build();
        let err = node.import(batch).await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidDate(_)), "got {err:?}");

        let batch = BatchBuilder::new()
            .task("ok", ymd(2016, 10, 1), 3)
            .task("late", NaiveDate::MAX, 1)
            .build();
        let err = node.import(batch).await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidDate(_)), "got {err:?}");

        assert_eq!(node.tasks().count(), 0);
        assert!(store.get_project_tasks("p").await?.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn empty_batch_writes_nothing() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;

        let summary = node.import(BatchBuilder::new().build()).await?;
        assert_eq!(summary, ImportSummary::default());
        assert!(store.get_project_tasks("p").await?.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn batch_closing_a_cycle_through_existing_edges_is_rejected() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 3)).await?;
        node.add_task(task("B", ymd(2016, 10, 1), 3)).await?;
        node.add_task_relation(after_end("A", "B")).await?;

        let batch = BatchBuilder::new()
            .task("C", ymd(2016, 10, 1), 3)
            .after_end("B", "C")
            .after_end("C", "A")
            .build();
        let err = node.import(batch).await.unwrap_err();
        assert!(matches!(err, GraphError::CyclicDependency(_)), "got {err:?}");

        assert!(node.task("C").is_none());
        assert!(store.get_task_relations("p", "B").await?.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn batch_may_reference_tasks_that_already_exist() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut graph = ProjectGraph::new(Arc::new(MemoryStore::new()));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 5)).await?;

        let batch = BatchBuilder::new()
            .task("B", ymd(2016, 9, 1), 2)
            .after_end("A", "B")
            .modifier("A", 1)
            .build();
        node.import(batch).await?;

        assert_eq!(node.task("B").unwrap().start_date(), ymd(2016, 10, 7));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn unknown_references_and_duplicates_are_rejected_up_front() -> TestResult {
    with_timeout(async {
        init_tracing();

        let store = MemoryStore::new();
        let mut graph = ProjectGraph::new(Arc::new(store.clone()));
        let node = graph.add_project(project("p")).await?;
        node.add_task(task("A", ymd(2016, 10, 1), 5)).await?;

        let dangling = BatchBuilder::new()
            .task("B", ymd(2016, 10, 1), 1)
            .after_end("B", "ghost")
            .build();
        match node.import(dangling).await {
            Err(GraphError::NotFound { kind, id }) => {
                assert_eq!(kind, EntityKind::Task);
                assert_eq!(id, "ghost");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }

        let unbound = BatchBuilder::new().bind("nowhere", "A", 0).build();
        assert!(matches!(
            node.import(unbound).await,
            Err(GraphError::NotFound { kind: EntityKind::Delay, .. })
        ));

        let clash = BatchBuilder::new().task("A", ymd(2016, 10, 1), 1).build();
        assert!(matches!(
            node.import(clash).await,
            Err(GraphError::Exists { kind: EntityKind::Task, .. })
        ));

        let twice = BatchBuilder::new()
            .delay("d", ymd(2016, 12, 1))
            .delay("d", ymd(2016, 12, 2))
            .build();
        assert!(matches!(
            node.import(twice).await,
            Err(GraphError::Exists { kind: EntityKind::Delay, .. })
        ));

        assert_eq!(store.get_project_tasks("p").await?.len(), 1);
        assert!(store.get_project_delays("p").await?.is_empty());
        Ok(())
    })
    .await
}
