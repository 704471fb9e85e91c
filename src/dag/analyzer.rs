// src/dag/analyzer.rs

//! Stateless cycle pre-check for bulk imports.
//!
//! Runs over a whole batch of tasks and relations before any of it reaches
//! a live [`Schedule`](super::Schedule), so an import is all-or-nothing.

use std::collections::HashSet;

use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{GraphError, Result};
use crate::types::{TaskDefinition, TaskRelation};

/// Fail with [`GraphError::CyclicDependency`] if the relations over the
/// given tasks contain a cycle.
///
/// Relations may mention ids that are not in `task_ids`; those become
/// nodes too.
pub fn ensure_acyclic<'a, T, R>(task_ids: T, relations: R) -> Result<()>
where
    T: IntoIterator<Item = &'a str>,
    R: IntoIterator<Item = &'a TaskRelation>,
{
    // Edge direction: previous -> next.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in task_ids {
        graph.add_node(id);
    }
    for relation in relations {
        graph.add_edge(relation.previous.as_str(), relation.next.as_str(), ());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut active: HashSet<&str> = HashSet::new();

    for start in graph.nodes() {
        if visited.contains(start) {
            continue;
        }

        // (node, its children, index of the next child to visit)
        let mut stack: Vec<(&str, Vec<&str>, usize)> =
            vec![(start, graph.neighbors(start).collect(), 0)];
        visited.insert(start);
        active.insert(start);

        while let Some((_, children, next)) = stack.last_mut() {
            let Some(&child) = children.get(*next) else {
                if let Some((done, _, _)) = stack.pop() {
                    active.remove(done);
                }
                continue;
            };
            *next += 1;

            if active.contains(child) {
                let mut path: Vec<&str> = stack
                    .iter()
                    .map(|(id, _, _)| *id)
                    .skip_while(|id| *id != child)
                    .collect();
                path.push(child);
                return Err(GraphError::CyclicDependency(format!(
                    "relation batch closes a cycle: {}",
                    path.join(" -> ")
                )));
            }
            if visited.insert(child) {
                active.insert(child);
                stack.push((child, graph.neighbors(child).collect(), 0));
            }
        }
    }

    debug!(
        tasks = graph.node_count(),
        relations = graph.edge_count(),
        "relation batch is acyclic"
    );
    Ok(())
}

/// [`ensure_acyclic`] over full task definitions.
pub fn ensure_batch_acyclic(tasks: &[TaskDefinition], relations: &[TaskRelation]) -> Result<()> {
    ensure_acyclic(tasks.iter().map(|t| t.id.as_str()), relations.iter())
}
