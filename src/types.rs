// src/types.rs

//! Plain records exchanged with the persistence layer.
//!
//! These carry no schedule state; the live, computed view of a task or
//! delay lives in [`crate::dag`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type ProjectId = String;
pub type TaskId = String;
pub type DelayId = String;

/// Server-assigned, increasing modifier identifier.
pub type ModifierId = u64;

/// Kind of entity referenced by a `NotFound` / `Exists` failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Task,
    Delay,
    Modifier,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Delay => "delay",
            EntityKind::Modifier => "modifier",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDefinition {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Baseline estimate for one task. Never changes once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub estimated_start_date: NaiveDate,
    /// Whole days; zero marks a milestone.
    pub estimated_duration: u32,
}

/// Point of the previous task a relation measures from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Beginning,
    #[default]
    End,
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginning" | "start" => Ok(Location::Beginning),
            "end" | "finish" => Ok(Location::End),
            other => Err(format!(
                "invalid anchor: {other} (expected \"beginning\" or \"end\")"
            )),
        }
    }
}

/// Precedence edge `previous -> next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRelation {
    pub previous: TaskId,
    #[serde(default)]
    pub previous_location: Location,
    pub next: TaskId,
    /// Signed whole days added to the previous task's anchor.
    #[serde(default)]
    pub lag: i64,
}

/// A modifier before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModifier {
    /// Signed whole days.
    pub duration: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: ModifierId,
    pub duration: i64,
    #[serde(default)]
    pub description: String,
}

/// An externally fixed deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayDefinition {
    pub id: DelayId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
}

/// Binds a task's end to a delay, offset by `lag` days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRelation {
    pub delay: DelayId,
    pub task: TaskId,
    #[serde(default)]
    pub lag: i64,
}
