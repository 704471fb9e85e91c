// src/dag/schedule.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, trace};

use super::delay_node::DelayNode;
use super::propagation::{descendants_in_order, reaches};
use super::task_node::{TaskNode, add_days};
use crate::errors::{GraphError, Result};
use crate::types::{
    DelayDefinition, DelayId, DelayRelation, EntityKind, Modifier, TaskDefinition, TaskId,
    TaskRelation,
};

/// Arena holding one project's task and delay nodes.
///
/// The arena is the sole owner of every node; parent/child edges and delay
/// bindings are id-based adjacency lists. This is the pure, synchronous
/// core: no IO, no persistence. [`ProjectNode`](crate::project::ProjectNode)
/// wraps it with the persist-then-commit mutation API.
///
/// Every mutating method either succeeds completely or leaves the arena
/// exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    tasks: HashMap<TaskId, TaskNode>,
    delays: HashMap<DelayId, DelayNode>,
    task_order: Vec<TaskId>,
    delay_order: Vec<DelayId>,
    journal: Option<Journal>,
}

/// Undo log for one transaction: the original of every node touched so far
/// (`None` for nodes the transaction created) plus the order lengths.
#[derive(Debug, Clone)]
struct Journal {
    tasks: HashMap<TaskId, Option<TaskNode>>,
    delays: HashMap<DelayId, Option<DelayNode>>,
    task_order_len: usize,
    delay_order_len: usize,
}

impl Journal {
    fn record_task(&mut self, id: &str, original: Option<&TaskNode>) {
        if !self.tasks.contains_key(id) {
            self.tasks.insert(id.to_string(), original.cloned());
        }
    }

    fn record_delay(&mut self, id: &str, original: Option<&DelayNode>) {
        if !self.delays.contains_key(id) {
            self.delays.insert(id.to_string(), original.cloned());
        }
    }
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self, id: &str) -> Option<&TaskNode> {
        self.tasks.get(id)
    }

    pub fn delay(&self, id: &str) -> Option<&DelayNode> {
        self.delays.get(id)
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn contains_delay(&self, id: &str) -> bool {
        self.delays.contains_key(id)
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode> {
        self.task_order.iter().filter_map(|id| self.tasks.get(id))
    }

    /// Delays in insertion order.
    pub fn delays(&self) -> impl Iterator<Item = &DelayNode> {
        self.delay_order.iter().filter_map(|id| self.delays.get(id))
    }

    pub fn task_count(&self) -> usize {
        self.task_order.len()
    }

    pub fn delay_count(&self) -> usize {
        self.delay_order.len()
    }

    /// Every relation currently in the graph, grouped by previous task.
    pub fn relations(&self) -> impl Iterator<Item = &TaskRelation> {
        self.tasks()
            .flat_map(|task| task.children().iter().map(|edge| &edge.relation))
    }

    pub fn insert_task(&mut self, definition: TaskDefinition) -> Result<&TaskNode> {
        if self.tasks.contains_key(&definition.id) {
            return Err(GraphError::exists(EntityKind::Task, definition.id));
        }
        let id = definition.id.clone();
        let node = TaskNode::new(definition)?;
        debug!(task = %id, start = %node.start_date(), duration = node.duration(), "task node created");

        if let Some(journal) = self.journal.as_mut() {
            journal.record_task(&id, None);
        }
        self.task_order.push(id.clone());
        Ok(self.tasks.entry(id).or_insert(node))
    }

    pub fn insert_delay(&mut self, definition: DelayDefinition) -> Result<&DelayNode> {
        if self.delays.contains_key(&definition.id) {
            return Err(GraphError::exists(EntityKind::Delay, definition.id));
        }
        let id = definition.id.clone();
        debug!(delay = %id, date = %definition.date, "delay node created");

        if let Some(journal) = self.journal.as_mut() {
            journal.record_delay(&id, None);
        }
        self.delay_order.push(id.clone());
        Ok(self.delays.entry(id).or_insert(DelayNode::new(definition)))
    }

    /// Validate an edge without inserting it.
    ///
    /// Fails with `NotFound` for unknown ends, and with `CyclicDependency`
    /// for a self-loop or when `previous` is already reachable from `next`.
    pub fn check_relation(&self, relation: &TaskRelation) -> Result<()> {
        for id in [&relation.previous, &relation.next] {
            if !self.tasks.contains_key(id) {
                return Err(GraphError::not_found(EntityKind::Task, id.as_str()));
            }
        }
        if reaches(&self.tasks, &relation.next, &relation.previous) {
            return Err(GraphError::CyclicDependency(format!(
                "relation {} -> {} closes a cycle",
                relation.previous, relation.next
            )));
        }
        Ok(())
    }

    /// Insert the edge `relation.previous -> relation.next` and repropagate
    /// from the child.
    ///
    /// The cycle check runs before either edge list is touched.
    pub fn add_child(&mut self, relation: TaskRelation) -> Result<()> {
        self.check_relation(&relation)?;

        self.transaction(|schedule| {
            let previous = relation.previous.clone();
            let next = relation.next.clone();

            schedule
                .task_mut(&next)?
                .push_parent(previous.clone(), relation.clone());
            schedule.task_mut(&previous)?.push_child(next.clone(), relation);
            debug!(previous = %previous, next = %next, "edge inserted");

            schedule.recompute_from([next.as_str()])?;
            Ok(())
        })
    }

    /// Append a modifier and repropagate into descendants and bound delays.
    pub fn apply_modifier(&mut self, task: &str, modifier: Modifier) -> Result<()> {
        if !self.tasks.contains_key(task) {
            return Err(GraphError::not_found(EntityKind::Task, task));
        }

        self.transaction(|schedule| {
            debug!(task = %task, modifier = modifier.id, days = modifier.duration, "modifier applied");
            schedule.task_mut(task)?.push_modifier(modifier);
            schedule.recompute_from([task])?;
            Ok(())
        })
    }

    /// Bind a task to a delay. The binding's initial margin is taken from
    /// the task's schedule as it stands right now.
    pub fn bind_delay(&mut self, relation: DelayRelation) -> Result<()> {
        let task_end = self
            .tasks
            .get(&relation.task)
            .map(TaskNode::end_date)
            .ok_or_else(|| GraphError::not_found(EntityKind::Task, relation.task.as_str()))?;
        let delay = self.delay_mut(&relation.delay)?;

        delay.bind(relation.task.clone(), relation.lag, task_end);
        debug!(
            delay = %relation.delay,
            task = %relation.task,
            lag = relation.lag,
            margin = ?delay.margin(),
            "delay bound"
        );

        self.task_mut(&relation.task)?.push_delay(relation.delay);
        Ok(())
    }

    /// Recompute one task from its current parents and modifiers.
    ///
    /// Returns whether its start or duration changed.
    pub fn compute(&mut self, task: &str) -> Result<bool> {
        let constrained_start = self.constrained_start(task)?;
        self.task_mut(task)?.settle(constrained_start)
    }

    /// Recompute `task` and everything downstream of it, then refresh the
    /// margins of every delay bound to a recomputed task.
    ///
    /// Descendants are visited in topological order, so each one is
    /// settled after all of its changed parents. Returns the ids that were
    /// recomputed.
    pub fn mark_and_compute(&mut self, task: &str) -> Result<Vec<TaskId>> {
        self.transaction(|schedule| schedule.recompute_from([task]))
    }

    /// Settle every task in the arena.
    pub fn settle_all(&mut self) -> Result<()> {
        let roots: Vec<TaskId> = self.task_order.clone();
        self.transaction(|schedule| {
            let settled = schedule.recompute_from(roots.iter().map(String::as_str))?;
            debug!(tasks = settled.len(), "full settle pass complete");
            Ok(())
        })
    }

    /// Delays bound to `task` or to anything downstream of it, de-duplicated.
    ///
    /// Tasks are walked in recomputation order (every task after its
    /// parents within the subtree), and each task's delays in bind order.
    pub fn delays_in_subtree(&self, task: &str) -> Result<Vec<&DelayNode>> {
        if !self.tasks.contains_key(task) {
            return Err(GraphError::not_found(EntityKind::Task, task));
        }

        let mut seen: Vec<&str> = Vec::new();
        for id in descendants_in_order(&self.tasks, [task])? {
            if let Some(node) = self.tasks.get(&id) {
                for delay in node.delays() {
                    if !seen.contains(&delay.as_str()) {
                        seen.push(delay.as_str());
                    }
                }
            }
        }

        Ok(seen.into_iter().filter_map(|id| self.delays.get(id)).collect())
    }

    fn recompute_from<'a, I>(&mut self, roots: I) -> Result<Vec<TaskId>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let order = descendants_in_order(&self.tasks, roots)?;

        for id in &order {
            let changed = self.compute(id)?;
            if changed {
                trace!(task = %id, "task schedule changed");
            }
            self.refresh_delays(id)?;
        }

        Ok(order)
    }

    fn refresh_delays(&mut self, task: &str) -> Result<()> {
        let node = self
            .tasks
            .get(task)
            .ok_or_else(|| GraphError::not_found(EntityKind::Task, task))?;
        let task_end = node.end_date();

        for delay_id in node.delays() {
            if let Some(delay) = self.delays.get_mut(delay_id) {
                if let Some(journal) = self.journal.as_mut() {
                    journal.record_delay(delay_id, Some(delay));
                }
                delay.refresh(task, task_end);
            }
        }
        Ok(())
    }

    /// Max over parents of `anchor(previous_location) + lag`, or `None` for
    /// a root.
    fn constrained_start(&self, task: &str) -> Result<Option<NaiveDate>> {
        let node = self
            .tasks
            .get(task)
            .ok_or_else(|| GraphError::not_found(EntityKind::Task, task))?;

        let mut start: Option<NaiveDate> = None;
        for edge in node.parents() {
            let parent = self
                .tasks
                .get(&edge.peer)
                .ok_or_else(|| GraphError::not_found(EntityKind::Task, edge.peer.as_str()))?;
            let candidate = add_days(
                parent.anchor(edge.relation.previous_location),
                edge.relation.lag,
            )?;
            start = Some(start.map_or(candidate, |current| current.max(candidate)));
        }
        Ok(start)
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut TaskNode> {
        let node = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Task, id))?;
        if let Some(journal) = self.journal.as_mut() {
            journal.record_task(id, Some(node));
        }
        Ok(node)
    }

    fn delay_mut(&mut self, id: &str) -> Result<&mut DelayNode> {
        let delay = self
            .delays
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Delay, id))?;
        if let Some(journal) = self.journal.as_mut() {
            journal.record_delay(id, Some(delay));
        }
        Ok(delay)
    }

    /// Run `f` against the arena, then restore it whatever the outcome.
    ///
    /// Lets a caller learn whether a mutation would succeed (dates in
    /// range, no cycle) before committing to it elsewhere, e.g. in a store.
    /// Only the nodes `f` touches are saved and restored.
    pub fn rehearse(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let journal = self.open_journal();
        let outer = self.journal.replace(journal);
        let result = f(self);
        if let Some(journal) = self.journal.take() {
            self.rollback(journal);
        }
        self.journal = outer;
        result
    }

    /// Run `f`, restoring every node it touched if it fails part way.
    ///
    /// Nested calls join the outermost transaction.
    fn transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.journal.is_some() {
            return f(self);
        }

        self.journal = Some(self.open_journal());
        let result = f(self);
        if let (Err(_), Some(journal)) = (&result, self.journal.take()) {
            trace!(
                tasks = journal.tasks.len(),
                delays = journal.delays.len(),
                "rolling back"
            );
            self.rollback(journal);
        }
        result
    }

    fn open_journal(&self) -> Journal {
        Journal {
            tasks: HashMap::new(),
            delays: HashMap::new(),
            task_order_len: self.task_order.len(),
            delay_order_len: self.delay_order.len(),
        }
    }

    fn rollback(&mut self, journal: Journal) {
        for (id, original) in journal.tasks {
            match original {
                Some(node) => {
                    self.tasks.insert(id, node);
                }
                None => {
                    self.tasks.remove(&id);
                }
            }
        }
        for (id, original) in journal.delays {
            match original {
                Some(node) => {
                    self.delays.insert(id, node);
                }
                None => {
                    self.delays.remove(&id);
                }
            }
        }
        self.task_order.truncate(journal.task_order_len);
        self.delay_order.truncate(journal.delay_order_len);
    }
}
