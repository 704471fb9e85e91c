// src/project/node.rs

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use super::import::{ImportBatch, ImportSummary};
use super::snapshot::ProjectSnapshot;
use crate::dag::{DelayNode, Schedule, TaskNode};
use crate::errors::{GraphError, Result};
use crate::store::ProjectStore;
use crate::types::{
    DelayDefinition, DelayRelation, EntityKind, Modifier, NewModifier, ProjectDefinition,
    TaskDefinition, TaskRelation,
};

/// One project's live graph plus the store it persists to.
///
/// Every mutation first rehearses its change on the in-memory graph (ids,
/// cycles, date range), then awaits the store write, and only then applies
/// the change to the [`Schedule`]. Anything the graph would reject is never
/// written, and a failed write leaves the graph untouched.
///
/// `ProjectNode` does not serialise concurrent callers itself; hand it to a
/// [`ProjectHandle`](crate::engine::ProjectHandle) when mutations can race.
#[derive(Debug)]
pub struct ProjectNode {
    definition: ProjectDefinition,
    store: Arc<dyn ProjectStore>,
    schedule: Schedule,
}

impl ProjectNode {
    /// An empty project. Call [`load`](Self::load) to pull persisted state.
    pub fn new(definition: ProjectDefinition, store: Arc<dyn ProjectStore>) -> Self {
        Self {
            definition,
            store,
            schedule: Schedule::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn definition(&self) -> &ProjectDefinition {
        &self.definition
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn task(&self, id: &str) -> Option<&TaskNode> {
        self.schedule.task(id)
    }

    pub fn delay(&self, id: &str) -> Option<&DelayNode> {
        self.schedule.delay(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode> {
        self.schedule.tasks()
    }

    pub fn delays(&self) -> impl Iterator<Item = &DelayNode> {
        self.schedule.delays()
    }

    /// Delays bound to `task` or to any task downstream of it.
    pub fn delays_in_subtree(&self, task: &str) -> Result<Vec<&DelayNode>> {
        self.schedule.delays_in_subtree(task)
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot::capture(&self.definition, &self.schedule)
    }

    /// Rebuild the graph from the store.
    ///
    /// Stages run strictly in order, each one complete before the next:
    /// tasks, delays, modifiers, task relations, delay relations, then a
    /// settle pass over every task. Reads inside a stage run concurrently.
    /// On failure the previously loaded graph is kept.
    pub async fn load(&mut self) -> Result<()> {
        let store = Arc::clone(&self.store);
        let project = self.definition.id.as_str();
        let mut schedule = Schedule::new();

        let tasks = store.get_project_tasks(project).await?;
        for task in tasks {
            schedule.insert_task(task)?;
        }
        debug!(project = %project, tasks = schedule.task_count(), "stage 1: tasks loaded");

        let delays = store.get_project_delays(project).await?;
        for delay in delays {
            schedule.insert_delay(delay)?;
        }
        debug!(project = %project, delays = schedule.delay_count(), "stage 2: delays loaded");

        let task_ids: Vec<String> = schedule.tasks().map(|t| t.id().to_string()).collect();

        let modifiers = try_join_all(
            task_ids
                .iter()
                .map(|task| store.get_task_modifiers(project, task)),
        )
        .await?;
        let mut modifier_count = 0;
        for (task, list) in task_ids.iter().zip(modifiers) {
            for modifier in list {
                schedule.apply_modifier(task, modifier)?;
                modifier_count += 1;
            }
        }
        debug!(project = %project, modifiers = modifier_count, "stage 3: modifiers attached");

        let relations = try_join_all(
            task_ids
                .iter()
                .map(|task| store.get_task_relations(project, task)),
        )
        .await?;
        let mut relation_count = 0;
        for relation in relations.into_iter().flatten() {
            schedule.add_child(relation)?;
            relation_count += 1;
        }
        debug!(project = %project, relations = relation_count, "stage 4: task relations linked");

        let delay_ids: Vec<String> = schedule.delays().map(|d| d.id().to_string()).collect();
        let delay_relations = try_join_all(
            delay_ids
                .iter()
                .map(|delay| store.get_delay_relations(project, delay)),
        )
        .await?;
        let mut binding_count = 0;
        for relation in delay_relations.into_iter().flatten() {
            schedule.bind_delay(relation)?;
            binding_count += 1;
        }
        debug!(project = %project, bindings = binding_count, "stage 5: delays bound");

        schedule.settle_all()?;

        info!(
            project = %project,
            tasks = schedule.task_count(),
            delays = schedule.delay_count(),
            relations = relation_count,
            "project loaded"
        );
        self.schedule = schedule;
        Ok(())
    }

    pub async fn add_task(&mut self, task: TaskDefinition) -> Result<&TaskNode> {
        if self.schedule.contains_task(&task.id) {
            return Err(GraphError::exists(EntityKind::Task, task.id));
        }
        self.rehearse("task", |schedule| {
            schedule.insert_task(task.clone()).map(|_| ())
        })?;

        let stored = self.store.add_task(&self.definition.id, task).await?;
        info!(project = %self.definition.id, task = %stored.id, "task added");
        self.schedule.insert_task(stored)
    }

    pub async fn add_delay(&mut self, delay: DelayDefinition) -> Result<&DelayNode> {
        if self.schedule.contains_delay(&delay.id) {
            return Err(GraphError::exists(EntityKind::Delay, delay.id));
        }

        let stored = self.store.add_delay(&self.definition.id, delay).await?;
        info!(project = %self.definition.id, delay = %stored.id, "delay added");
        self.schedule.insert_delay(stored)
    }

    /// Add a precedence edge.
    ///
    /// Unknown ends fail with `NotFound`; a self-loop or an edge that would
    /// close a cycle fails with `CyclicDependency`; a lag that pushes a
    /// downstream date out of range fails with `InvalidDate`. All of these
    /// are found before the store is called, so a rejected relation is
    /// never persisted.
    pub async fn add_task_relation(&mut self, relation: TaskRelation) -> Result<()> {
        self.rehearse("task relation", |schedule| {
            schedule.add_child(relation.clone())
        })?;

        let stored = self
            .store
            .add_task_relation(&self.definition.id, relation)
            .await?;
        info!(
            project = %self.definition.id,
            previous = %stored.previous,
            next = %stored.next,
            lag = stored.lag,
            "task relation added"
        );
        self.schedule.add_child(stored)
    }

    pub async fn add_delay_relation(&mut self, relation: DelayRelation) -> Result<()> {
        if !self.schedule.contains_delay(&relation.delay) {
            return Err(GraphError::not_found(EntityKind::Delay, relation.delay));
        }
        if !self.schedule.contains_task(&relation.task) {
            return Err(GraphError::not_found(EntityKind::Task, relation.task));
        }

        let stored = self
            .store
            .add_delay_relation(&self.definition.id, relation)
            .await?;
        info!(
            project = %self.definition.id,
            delay = %stored.delay,
            task = %stored.task,
            lag = stored.lag,
            "delay relation added"
        );
        self.schedule.bind_delay(stored)
    }

    /// Persist a modifier, associate it with `task`, and repropagate.
    ///
    /// Returns the modifier with its store-assigned id.
    pub async fn add_modifier(&mut self, task: &str, modifier: NewModifier) -> Result<Modifier> {
        if !self.schedule.contains_task(task) {
            return Err(GraphError::not_found(EntityKind::Task, task));
        }
        // The store assigns the real id; it plays no part in the dates.
        let staged = Modifier {
            id: 0,
            duration: modifier.duration,
            description: modifier.description.clone(),
        };
        self.rehearse("modifier", |schedule| {
            schedule.apply_modifier(task, staged)
        })?;

        let stored = self
            .store
            .add_modifier(&self.definition.id, modifier)
            .await?;
        self.store
            .add_modifier_for_task(&self.definition.id, task, stored.id)
            .await?;
        info!(
            project = %self.definition.id,
            task = %task,
            modifier = stored.id,
            days = stored.duration,
            "modifier added"
        );

        self.schedule.apply_modifier(task, stored.clone())?;
        Ok(stored)
    }

    /// Import a whole batch.
    ///
    /// The batch is validated against the live graph first (duplicates,
    /// unknown references, cycles) and then rehearsed on it as a whole, so
    /// an out-of-range date anywhere in the batch rejects all of it. Only if
    /// both pass are its entries issued one at a time through the regular
    /// mutation API, so each task exists before any relation that
    /// references it.
    pub async fn import(&mut self, batch: ImportBatch) -> Result<ImportSummary> {
        if batch.is_empty() {
            debug!(project = %self.definition.id, "empty import batch");
            return Ok(ImportSummary::default());
        }
        if let Err(err) = batch.validate_against(&self.schedule) {
            warn!(project = %self.definition.id, error = %err, "import batch rejected");
            return Err(err);
        }
        self.rehearse("import batch", |schedule| batch.apply_to(schedule))?;

        let mut summary = ImportSummary::default();

        for task in batch.tasks {
            self.add_task(task).await?;
            summary.tasks += 1;
        }
        for delay in batch.delays {
            self.add_delay(delay).await?;
            summary.delays += 1;
        }
        for relation in batch.relations {
            self.add_task_relation(relation).await?;
            summary.relations += 1;
        }
        for relation in batch.delay_relations {
            self.add_delay_relation(relation).await?;
            summary.delay_relations += 1;
        }
        for entry in batch.modifiers {
            self.add_modifier(&entry.task, entry.modifier).await?;
            summary.modifiers += 1;
        }

        info!(project = %self.definition.id, ?summary, "import complete");
        Ok(summary)
    }

    /// Dry-run a change on the schedule, logging and returning any
    /// rejection.
    fn rehearse(
        &mut self,
        what: &str,
        change: impl FnOnce(&mut Schedule) -> Result<()>,
    ) -> Result<()> {
        self.schedule.rehearse(change).inspect_err(|err| {
            warn!(project = %self.definition.id, error = %err, "{what} rejected");
        })
    }
}
