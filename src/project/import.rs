// src/project/import.rs

//! Bulk import batches.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dag::{Schedule, ensure_acyclic};
use crate::errors::{GraphError, Result};
use crate::types::{
    DelayDefinition, DelayRelation, EntityKind, Modifier, NewModifier, TaskDefinition, TaskId,
    TaskRelation,
};

/// A modifier addressed to a task by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskModifier {
    pub task: TaskId,
    pub modifier: NewModifier,
}

/// Everything a single import adds to a project.
///
/// Applied in this order: tasks, delays, task relations, delay relations,
/// modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
    #[serde(default)]
    pub delays: Vec<DelayDefinition>,
    #[serde(default)]
    pub relations: Vec<TaskRelation>,
    #[serde(default)]
    pub delay_relations: Vec<DelayRelation>,
    #[serde(default)]
    pub modifiers: Vec<TaskModifier>,
}

/// What an import wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub tasks: usize,
    pub delays: usize,
    pub relations: usize,
    pub delay_relations: usize,
    pub modifiers: usize,
}

impl ImportBatch {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.delays.is_empty()
            && self.relations.is_empty()
            && self.delay_relations.is_empty()
            && self.modifiers.is_empty()
    }

    /// Check the batch against what `schedule` already holds.
    ///
    /// Fails with `Exists` for duplicate ids, `NotFound` for references to
    /// ids that neither the batch nor the schedule define, and
    /// `CyclicDependency` if the batch's relations together with the
    /// existing ones contain a cycle. Nothing is mutated.
    pub fn validate_against(&self, schedule: &Schedule) -> Result<()> {
        let mut task_ids: HashSet<&str> = schedule.tasks().map(|t| t.id()).collect();
        for task in &self.tasks {
            if !task_ids.insert(task.id.as_str()) {
                return Err(GraphError::exists(EntityKind::Task, task.id.as_str()));
            }
        }

        let mut delay_ids: HashSet<&str> = schedule.delays().map(|d| d.id()).collect();
        for delay in &self.delays {
            if !delay_ids.insert(delay.id.as_str()) {
                return Err(GraphError::exists(EntityKind::Delay, delay.id.as_str()));
            }
        }

        let known_task = |id: &str| -> Result<()> {
            if task_ids.contains(id) {
                Ok(())
            } else {
                Err(GraphError::not_found(EntityKind::Task, id))
            }
        };

        for relation in &self.relations {
            known_task(&relation.previous)?;
            known_task(&relation.next)?;
        }
        for relation in &self.delay_relations {
            if !delay_ids.contains(relation.delay.as_str()) {
                return Err(GraphError::not_found(
                    EntityKind::Delay,
                    relation.delay.as_str(),
                ));
            }
            known_task(&relation.task)?;
        }
        for entry in &self.modifiers {
            known_task(&entry.task)?;
        }

        ensure_acyclic(
            task_ids.iter().copied(),
            schedule.relations().chain(self.relations.iter()),
        )
    }

    /// Apply the whole batch to `schedule` in import order.
    ///
    /// Modifiers get placeholder id 0. Meant to run inside
    /// [`Schedule::rehearse`], which undoes it afterwards.
    pub fn apply_to(&self, schedule: &mut Schedule) -> Result<()> {
        for task in &self.tasks {
            schedule.insert_task(task.clone())?;
        }
        for delay in &self.delays {
            schedule.insert_delay(delay.clone())?;
        }
        for relation in &self.relations {
            schedule.add_child(relation.clone())?;
        }
        for relation in &self.delay_relations {
            schedule.bind_delay(relation.clone())?;
        }
        for entry in &self.modifiers {
            let modifier = Modifier {
                id: 0,
                duration: entry.modifier.duration,
                description: entry.modifier.description.clone(),
            };
            schedule.apply_modifier(&entry.task, modifier)?;
        }
        Ok(())
    }
}
