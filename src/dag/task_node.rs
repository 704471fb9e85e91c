// src/dag/task_node.rs

//! Live schedule state of one task.

use chrono::{NaiveDate, TimeDelta};

use crate::errors::{GraphError, Result};
use crate::types::{DelayId, Location, Modifier, TaskDefinition, TaskId, TaskRelation};

/// One side of a precedence edge, as seen from the task that stores it.
///
/// `peer` is the parent for entries in [`TaskNode::parents`] and the child
/// for entries in [`TaskNode::children`]. Peers are referenced by id; the
/// owning [`Schedule`](super::Schedule) resolves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub peer: TaskId,
    pub relation: TaskRelation,
}

#[derive(Debug, Clone)]
pub struct TaskNode {
    definition: TaskDefinition,
    start_date: NaiveDate,
    duration: i64,
    end_date: NaiveDate,
    parents: Vec<Edge>,
    children: Vec<Edge>,
    delays: Vec<DelayId>,
    modifiers: Vec<Modifier>,
}

impl TaskNode {
    pub fn new(definition: TaskDefinition) -> Result<Self> {
        let start_date = definition.estimated_start_date;
        let duration = i64::from(definition.estimated_duration);
        let end_date = add_days(start_date, duration)?;
        Ok(Self {
            definition,
            start_date,
            duration,
            end_date,
            parents: Vec::new(),
            children: Vec::new(),
            delays: Vec::new(),
            modifiers: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    pub fn estimated_start_date(&self) -> NaiveDate {
        self.definition.estimated_start_date
    }

    pub fn estimated_duration(&self) -> u32 {
        self.definition.estimated_duration
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// `start_date + duration` days.
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn is_milestone(&self) -> bool {
        self.definition.estimated_duration == 0
    }

    pub fn parents(&self) -> &[Edge] {
        &self.parents
    }

    pub fn children(&self) -> &[Edge] {
        &self.children
    }

    /// Ids of the delays this task is bound to, in binding order.
    pub fn delays(&self) -> &[DelayId] {
        &self.delays
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn modifier_total(&self) -> i64 {
        self.modifiers.iter().map(|m| m.duration).sum()
    }

    /// Date a relation anchored at `location` of this task measures from.
    pub fn anchor(&self, location: Location) -> NaiveDate {
        match location {
            Location::Beginning => self.start_date,
            Location::End => self.end_date,
        }
    }

    /// Recompute start/duration with no structural change.
    ///
    /// `constrained_start` is the max-over-parents start, or `None` for a
    /// root, which falls back to the baseline. Modifiers extend the duration,
    /// except on milestones where they shift the start and the duration
    /// stays zero.
    ///
    /// Returns whether anything changed. On error the node is untouched.
    pub(crate) fn settle(&mut self, constrained_start: Option<NaiveDate>) -> Result<bool> {
        let base = constrained_start.unwrap_or(self.definition.estimated_start_date);
        let total = self.modifier_total();

        let (start_date, duration) = if self.is_milestone() {
            (add_days(base, total)?, 0)
        } else {
            (base, i64::from(self.definition.estimated_duration) + total)
        };
        let end_date = add_days(start_date, duration)?;

        let changed = start_date != self.start_date || duration != self.duration;
        self.start_date = start_date;
        self.duration = duration;
        self.end_date = end_date;
        Ok(changed)
    }

    pub(crate) fn push_parent(&mut self, parent: TaskId, relation: TaskRelation) {
        self.parents.push(Edge {
            peer: parent,
            relation,
        });
    }

    pub(crate) fn push_child(&mut self, child: TaskId, relation: TaskRelation) {
        self.children.push(Edge {
            peer: child,
            relation,
        });
    }

    pub(crate) fn push_delay(&mut self, delay: DelayId) {
        self.delays.push(delay);
    }

    pub(crate) fn push_modifier(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }
}

/// `date + days`, failing with [`GraphError::InvalidDate`] outside the
/// representable calendar.
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| GraphError::InvalidDate(format!("{date} shifted by {days} days")))
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}
