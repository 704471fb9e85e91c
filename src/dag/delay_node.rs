// src/dag/delay_node.rs

//! Live margin bookkeeping for one fixed deadline.

use chrono::NaiveDate;

use super::task_node::days_between;
use crate::types::{DelayDefinition, TaskId};

/// One task bound to a delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayBinding {
    pub task: TaskId,
    pub lag: i64,
    /// Margin at the moment of binding. Never recomputed.
    pub initial_margin: i64,
    /// Margin against the task's current end.
    pub margin: i64,
}

#[derive(Debug, Clone)]
pub struct DelayNode {
    definition: DelayDefinition,
    bindings: Vec<DelayBinding>,
}

impl DelayNode {
    pub fn new(definition: DelayDefinition) -> Self {
        Self {
            definition,
            bindings: Vec::new(),
        }
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

    pub fn definition(&self) -> &DelayDefinition {
        &self.definition
    }

    pub fn date(&self) -> NaiveDate {
        self.definition.date
    }

    pub fn bindings(&self) -> &[DelayBinding] {
        &self.bindings
    }

    /// Minimum live margin over bound tasks; `None` until something is bound.
    pub fn margin(&self) -> Option<i64> {
        self.bindings.iter().map(|b| b.margin).min()
    }

    /// Minimum of the per-binding margins frozen at bind time.
    ///
    /// Binding another task later can still lower this, because the new
    /// binding's value enters the minimum.
    pub fn initial_margin(&self) -> Option<i64> {
        self.bindings.iter().map(|b| b.initial_margin).min()
    }

    /// `days(task_end, date) - lag`.
    pub fn margin_for(&self, task_end: NaiveDate, lag: i64) -> i64 {
        days_between(task_end, self.definition.date) - lag
    }

    pub(crate) fn bind(&mut self, task: TaskId, lag: i64, task_end: NaiveDate) {
        let margin = self.margin_for(task_end, lag);
        self.bindings.push(DelayBinding {
            task,
            lag,
            initial_margin: margin,
            margin,
        });
    }

    /// Refresh the live margin of every binding that belongs to `task`.
    pub(crate) fn refresh(&mut self, task: &str, task_end: NaiveDate) {
        let date = self.definition.date;
        for binding in self.bindings.iter_mut().filter(|b| b.task == task) {
            binding.margin = days_between(task_end, date) - binding.lag;
        }
    }
}
