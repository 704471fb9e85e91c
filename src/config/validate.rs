// src/config/validate.rs

use chrono::NaiveDate;

use crate::config::model::{PlanFile, PlannedProject, RawPlanFile, RawProjectConfig};
use crate::dag::Schedule;
use crate::errors::{GraphError, Result};
use crate::project::{ImportBatch, TaskModifier};
use crate::types::{
    DelayDefinition, DelayRelation, NewModifier, ProjectDefinition, TaskDefinition, TaskRelation,
};

/// Plan files accept ISO calendar dates only.
const DATE_FORMAT: &str = "%Y-%m-%d";

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = GraphError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_projects(&raw)?;

        let mut projects = Vec::with_capacity(raw.project.len());
        for (id, project) in raw.project {
            projects.push(plan_project(id, project)?);
        }
        Ok(PlanFile::new_unchecked(projects))
    }
}

fn ensure_has_projects(raw: &RawPlanFile) -> Result<()> {
    if raw.project.is_empty() {
        return Err(GraphError::Config(
            "plan must contain at least one [project.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn plan_project(id: String, raw: RawProjectConfig) -> Result<PlannedProject> {
    let mut batch = ImportBatch::default();

    for (task_id, task) in raw.task {
        let estimated_start_date =
            parse_date(&task.start, &format!("project '{id}' task '{task_id}' start"))?;
        batch.tasks.push(TaskDefinition {
            name: task.name.unwrap_or_else(|| task_id.clone()),
            id: task_id,
            description: task.description,
            estimated_start_date,
            estimated_duration: task.duration,
        });
    }

    for (delay_id, delay) in raw.delay {
        let date = parse_date(&delay.date, &format!("project '{id}' delay '{delay_id}' date"))?;
        batch.delays.push(DelayDefinition {
            name: delay.name.unwrap_or_else(|| delay_id.clone()),
            id: delay_id,
            description: delay.description,
            date,
        });
    }

    batch.relations = raw
        .relation
        .into_iter()
        .map(|r| TaskRelation {
            previous: r.previous,
            previous_location: r.anchor,
            next: r.next,
            lag: r.lag,
        })
        .collect();

    batch.delay_relations = raw
        .delay_relation
        .into_iter()
        .map(|r| DelayRelation {
            delay: r.delay,
            task: r.task,
            lag: r.lag,
        })
        .collect();

    batch.modifiers = raw
        .modifier
        .into_iter()
        .map(|m| TaskModifier {
            task: m.task,
            modifier: NewModifier {
                duration: m.duration,
                description: m.description,
            },
        })
        .collect();

    // Duplicates, dangling references and cycles, then date range, against
    // an empty project.
    batch.validate_against(&Schedule::new())?;
    batch.apply_to(&mut Schedule::new())?;

    Ok(PlannedProject {
        definition: ProjectDefinition {
            name: raw.name.unwrap_or_else(|| id.clone()),
            id,
            description: raw.description,
        },
        batch,
    })
}

fn parse_date(value: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|err| GraphError::InvalidDate(format!("{what}: '{value}' ({err})")))
}
