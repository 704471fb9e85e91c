#![allow(dead_code)]

use chrono::NaiveDate;
use plandag::project::{ImportBatch, TaskModifier};
use plandag::types::{
    DelayDefinition, DelayRelation, Location, NewModifier, ProjectDefinition, TaskDefinition,
    TaskRelation,
};

/// Calendar date shorthand for tests.
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date in test")
}

pub fn project(id: &str) -> ProjectDefinition {
    ProjectDefinition {
        id: id.to_string(),
        name: format!("project {id}"),
        description: String::new(),
    }
}

/// Task with name = id and no description.
pub fn task(id: &str, start: NaiveDate, duration: u32) -> TaskDefinition {
    TaskBuilder::new(id, start, duration).build()
}

pub fn delay(id: &str, date: NaiveDate) -> DelayDefinition {
    DelayDefinition {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        date,
    }
}

/// `previous` end -> `next`, no lag.
pub fn after_end(previous: &str, next: &str) -> TaskRelation {
    relation(previous, Location::End, next, 0)
}

pub fn relation(previous: &str, location: Location, next: &str, lag: i64) -> TaskRelation {
    TaskRelation {
        previous: previous.to_string(),
        previous_location: location,
        next: next.to_string(),
        lag,
    }
}

pub fn delay_relation(delay: &str, task: &str, lag: i64) -> DelayRelation {
    DelayRelation {
        delay: delay.to_string(),
        task: task.to_string(),
        lag,
    }
}

pub fn modifier(duration: i64) -> NewModifier {
    NewModifier {
        duration,
        description: format!("{duration:+} days"),
    }
}

/// Builder for `TaskDefinition`.
pub struct TaskBuilder {
    task: TaskDefinition,
}

impl TaskBuilder {
    pub fn new(id: &str, start: NaiveDate, duration: u32) -> Self {
        Self {
            task: TaskDefinition {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
                estimated_start_date: start,
                estimated_duration: duration,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.task.name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.task.description = description.to_string();
        self
    }

    pub fn build(self) -> TaskDefinition {
        self.task
    }
}

/// Builder for `ImportBatch`.
#[derive(Default)]
pub struct BatchBuilder {
    batch: ImportBatch,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, id: &str, start: NaiveDate, duration: u32) -> Self {
        self.batch.tasks.push(task(id, start, duration));
        self
    }

    pub fn delay(mut self, id: &str, date: NaiveDate) -> Self {
        self.batch.delays.push(delay(id, date));
        self
    }

    pub fn after_end(mut self, previous: &str, next: &str) -> Self {
        self.batch.relations.push(after_end(previous, next));
        self
    }

    pub fn relation(mut self, relation: TaskRelation) -> Self {
        self.batch.relations.push(relation);
        self
    }

    pub fn bind(mut self, delay: &str, task: &str, lag: i64) -> Self {
        self.batch
            .delay_relations
            .push(delay_relation(delay, task, lag));
        self
    }

    pub fn modifier(mut self, task: &str, duration: i64) -> Self {
        self.batch.modifiers.push(TaskModifier {
            task: task.to_string(),
            modifier: modifier(duration),
        });
        self
    }

    pub fn build(self) -> ImportBatch {
        self.batch
    }
}

/// The four-task diamond used across the schedule tests:
///
/// ```text
/// A (2016-10-01, 30) -> B (2016-10-15, 15) -> D (2016-11-16, 15)
/// A                  -> C (2016-11-01, 10) -> D
/// ```
///
/// All relations anchor at the end of the previous task with no lag.
pub fn diamond_tasks() -> Vec<TaskDefinition> {
    vec![
        task("A", ymd(2016, 10, 1), 30),
        task("B", ymd(2016, 10, 15), 15),
        task("C", ymd(2016, 11, 1), 10),
        task("D", ymd(2016, 11, 16), 15),
    ]
}
