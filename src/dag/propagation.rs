// src/dag/propagation.rs

//! Explicit-stack traversals over the child edges of a task arena.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::task_node::TaskNode;
use crate::errors::{GraphError, Result};
use crate::types::{EntityKind, TaskId};

/// Every task reachable from `roots` (roots included), ordered so that each
/// task comes after all of its parents that are also in the result.
///
/// Depth-first with an explicit stack; the result is the reverse post-order.
/// A task met again while still on the active path is a cycle and fails
/// with [`GraphError::CyclicDependency`].
pub fn descendants_in_order<'a, I>(tasks: &HashMap<TaskId, TaskNode>, roots: I) -> Result<Vec<TaskId>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut finished: HashSet<TaskId> = HashSet::new();
    let mut active: HashSet<TaskId> = HashSet::new();
    let mut post_order: Vec<TaskId> = Vec::new();

    for root in roots {
        if finished.contains(root) {
            continue;
        }

        // (task, index of the next child edge to follow)
        let mut stack: Vec<(TaskId, usize)> = vec![(root.to_string(), 0)];
        active.insert(root.to_string());

        while let Some(frame) = stack.last_mut() {
            let node = tasks
                .get(&frame.0)
                .ok_or_else(|| GraphError::not_found(EntityKind::Task, frame.0.as_str()))?;
            let next = node.children().get(frame.1).map(|edge| edge.peer.clone());
            frame.1 += 1;

            match next {
                Some(child) => {
                    if active.contains(&child) {
                        let path = cycle_path(&stack, &child);
                        warn!(task = %child, %path, "task re-entered while on the active path");
                        return Err(GraphError::CyclicDependency(path));
                    }
                    if finished.contains(&child) {
                        continue;
                    }
                    active.insert(child.clone());
                    stack.push((child, 0));
                }
                None => {
                    if let Some((id, _)) = stack.pop() {
                        active.remove(&id);
                        finished.insert(id.clone());
                        post_order.push(id);
                    }
                }
            }
        }
    }

    post_order.reverse();
    Ok(post_order)
}

/// Whether `target` can be reached from `from` by following child edges.
pub fn reaches(tasks: &HashMap<TaskId, TaskNode>, from: &str, target: &str) -> bool {
    let mut stack = vec![from];
    let mut seen: HashSet<&str> = HashSet::new();

    while let Some(id) = stack.pop() {
        if id == target {
            return true;
        }
        if !seen.insert(id) {
            continue;
        }
        if let Some(node) = tasks.get(id) {
            stack.extend(node.children().iter().map(|edge| edge.peer.as_str()));
        }
    }

    false
}

fn cycle_path(stack: &[(TaskId, usize)], reentered: &str) -> String {
    let start = stack
        .iter()
        .position(|(id, _)| id == reentered)
        .unwrap_or(0);
    let mut path: Vec<&str> = stack[start..].iter().map(|(id, _)| id.as_str()).collect();
    path.push(reentered);
    path.join(" -> ")
}
