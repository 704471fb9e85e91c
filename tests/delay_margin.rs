// tests/delay_margin.rs

use std::error::Error;
use std::sync::Arc;

use plandag::errors::GraphError;
use plandag::project::{ProjectGraph, ProjectNode};
use plandag::store::{MemoryStore, ProjectStore};
use plandag_test_utils::builders::{
    after_end, delay, delay_relation, modifier, project, task, ymd,
};
use plandag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

async fn empty_project(id: &str) -> Result<ProjectNode, GraphError> {
    let store: Arc<dyn ProjectStore> = Arc::new(MemoryStore::new());
    let mut graph = ProjectGraph::new(store);
    graph.add_project(project(id)).await?;
    Ok(graph
        .into_projects()
        .remove(id)
        .expect("project just registered"))
}

#[tokio::test]
async fn margin_tracks_modifiers_while_initial_margin_stays_frozen() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut node = empty_project("p").await?;
        node.add_task(task("T", ymd(2016, 10, 1), 15)).await?;
        node.add_delay(delay("deadline", ymd(2016, 10, 18))).await?;
        node.add_delay_relation(delay_relation("deadline", "T", 0))
            .await?;

        let d = node.delay("deadline").unwrap();
        assert_eq!(node.task("T").unwrap().end_date(), ymd(2016, 10, 16));
        assert_eq!(d.initial_margin(), Some(2));
        assert_eq!(d.margin(), Some(2));

        node.add_modifier("T", modifier(3)).await?;

        let d = node.delay("deadline").unwrap();
        assert_eq!(d.margin(), Some(-1));
        assert_eq!(d.initial_margin(), Some(2));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn initial_margin_is_taken_at_bind_time_not_from_the_estimate() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut node = empty_project("p").await?;
        node.add_task(task("T", ymd(2016, 10, 1), 15)).await?;
        node.add_delay(delay("deadline", ymd(2016, 10, 18))).await?;

        node.add_modifier("T", modifier(3)).await?;
        node.add_delay_relation(delay_relation("deadline", "T", 0))
            .await?;

        let d = node.delay("deadline").unwrap();
        assert_eq!(d.initial_margin(), Some(-1));
        assert_eq!(d.margin(), Some(-1));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn binding_another_task_can_lower_the_aggregate_initial_margin() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut node = empty_project("p").await?;
        node.add_task(task("T1", ymd(2016, 10, 1), 15)).await?;
        node.add_task(task("T2", ymd(2016, 10, 5), 15)).await?;
        node.add_delay(delay("deadline", ymd(2016, 10, 18))).await?;

        node.add_delay_relation(delay_relation("deadline", "T1", 0))
            .await?;
        node.add_modifier("T1", modifier(1)).await?;

        let d = node.delay("deadline").unwrap();
        assert_eq!(d.initial_margin(), Some(2));
        assert_eq!(d.margin(), Some(1));

        // T2 ends 2016-10-20.
        node.add_delay_relation(delay_relation("deadline", "T2", 0))
            .await?;

        let d = node.delay("deadline").unwrap();
        assert_eq!(d.initial_margin(), Some(-2));
        assert_eq!(d.margin(), Some(-2));

        let frozen: Vec<i64> = d.bindings().iter().map(|b| b.initial_margin).collect();
        assert_eq!(frozen, vec![2, -2]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn lag_is_subtracted_and_upstream_changes_reach_the_delay() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut node = empty_project("p").await?;
        node.add_task(task("A", ymd(2016, 10, 1), 5)).await?;
        node.add_task(task("B", ymd(2016, 10, 1), 10)).await?;
        node.add_task_relation(after_end("A", "B")).await?;
        node.add_delay(delay("deadline", ymd(2016, 10, 20))).await?;
        node.add_delay_relation(delay_relation("deadline", "B", 1))
            .await?;

        // B: 2016-10-06 .. 2016-10-16, four days early, minus one day lag.
        let d = node.delay("deadline").unwrap();
        assert_eq!(d.margin(), Some(3));

        node.add_modifier("A", modifier(4)).await?;
        let d = node.delay("deadline").unwrap();
        assert_eq!(d.margin(), Some(-1));
        assert_eq!(d.initial_margin(), Some(3));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn unbound_delay_has_no_margin() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut node = empty_project("p").await?;
        node.add_delay(delay("deadline", ymd(2016, 10, 18))).await?;

        let d = node.delay("deadline").unwrap();
        assert_eq!(d.margin(), None);
        assert_eq!(d.initial_margin(), None);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn delays_in_subtree_follow_child_edges() -> TestResult {
    with_timeout(async {
        init_tracing();

        let mut node = empty_project("p").await?;
        for id in ["A", "B", "C", "X"] {
            node.add_task(task(id, ymd(2016, 10, 1), 2)).await?;
        }
        node.add_task_relation(after_end("A", "B")).await?;
        node.add_task_relation(after_end("B", "C")).await?;
        for id in ["d1", "d2", "d3", "d4"] {
            node.add_delay(delay(id, ymd(2016, 12, 1))).await?;
        }
        node.add_delay_relation(delay_relation("d1", "B", 0)).await?;
        node.add_delay_relation(delay_relation("d2", "C", 0)).await?;
        node.add_delay_relation(delay_relation("d3", "A", 0)).await?;
        node.add_delay_relation(delay_relation("d4", "X", 0)).await?;
        node.add_delay_relation(delay_relation("d2", "B", 0)).await?;

        let ids = |task: &str| -> Result<Vec<String>, GraphError> {
            Ok(node
                .delays_in_subtree(task)?
                .into_iter()
                .map(|d| d.id().to_string())
                .collect())
        };

        assert_eq!(ids("B")?, vec!["d1", "d2"]);
        assert_eq!(ids("A")?, vec!["d3", "d1", "d2"]);
        assert_eq!(ids("X")?, vec!["d4"]);
        assert!(matches!(
            ids("ghost"),
            Err(GraphError::NotFound { .. })
        ));
        Ok(())
    })
    .await
}
