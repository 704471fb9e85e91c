// src/project/snapshot.rs

//! Owned, read-only views of a project's computed schedule.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dag::{DelayNode, Schedule, TaskNode};
use crate::types::{DelayId, ProjectDefinition, ProjectId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub name: String,
    pub estimated_start_date: NaiveDate,
    pub estimated_duration: u32,
    pub start_date: NaiveDate,
    pub duration: i64,
    pub end_date: NaiveDate,
}

impl From<&TaskNode> for TaskSnapshot {
    fn from(node: &TaskNode) -> Self {
        Self {
            id: node.id().to_string(),
            name: node.name().to_string(),
            estimated_start_date: node.estimated_start_date(),
            estimated_duration: node.estimated_duration(),
            start_date: node.start_date(),
            duration: node.duration(),
            end_date: node.end_date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelaySnapshot {
    pub id: DelayId,
    pub name: String,
    pub date: NaiveDate,
    pub margin: Option<i64>,
    pub initial_margin: Option<i64>,
}

impl From<&DelayNode> for DelaySnapshot {
    fn from(node: &DelayNode) -> Self {
        Self {
            id: node.id().to_string(),
            name: node.name().to_string(),
            date: node.date(),
            margin: node.margin(),
            initial_margin: node.initial_margin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSnapshot {
    pub id: ProjectId,
    pub name: String,
    pub tasks: Vec<TaskSnapshot>,
    pub delays: Vec<DelaySnapshot>,
}

impl ProjectSnapshot {
    pub fn capture(definition: &ProjectDefinition, schedule: &Schedule) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            tasks: schedule.tasks().map(TaskSnapshot::from).collect(),
            delays: schedule.delays().map(DelaySnapshot::from).collect(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&TaskSnapshot> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn delay(&self, id: &str) -> Option<&DelaySnapshot> {
        self.delays.iter().find(|d| d.id == id)
    }
}
