// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod project;
pub mod store;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::model::{PlanFile, PlannedProject};
use crate::engine::ProjectHandle;
use crate::project::{ProjectGraph, ProjectSnapshot};
use crate::store::{MemoryStore, ProjectStore};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan loading and validation
/// - an in-memory store behind a `ProjectGraph`
/// - one `ProjectHandle` per project, importing its planned batch
/// - printing the computed schedules
pub async fn run(args: CliArgs) -> Result<()> {
    let plan = load_and_validate(&args.plan)?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let store: Arc<dyn ProjectStore> = Arc::new(MemoryStore::new());
    let mut graph = ProjectGraph::new(store);
    graph.load().await?;

    for planned in selected_projects(&plan, args.project.as_deref())? {
        graph.add_project(planned.definition.clone()).await?;
    }

    for node in graph.into_projects().into_values() {
        let (handle, runtime) = ProjectHandle::spawn(node);
        if let Some(planned) = plan.project(handle.project_id()) {
            let summary = handle.import(planned.batch.clone()).await?;
            info!(project = %handle.project_id(), ?summary, "plan imported");
        }
        print_schedule(&handle.snapshot().await?);

        drop(handle);
        runtime.await?;
    }

    Ok(())
}

fn selected_projects<'a>(plan: &'a PlanFile, only: Option<&str>) -> Result<Vec<&'a PlannedProject>> {
    match only {
        None => Ok(plan.projects.iter().collect()),
        Some(id) => plan
            .project(id)
            .map(|p| vec![p])
            .ok_or_else(|| anyhow::anyhow!("project '{id}' is not defined in the plan")),
    }
}

fn print_schedule(snapshot: &ProjectSnapshot) {
    println!("project {} ({})", snapshot.id, snapshot.name);

    println!("  tasks ({}):", snapshot.tasks.len());
    for task in &snapshot.tasks {
        println!(
            "    - {:<20} start {}  duration {:>4}  end {}",
            task.id, task.start_date, task.duration, task.end_date
        );
    }

    if !snapshot.delays.is_empty() {
        println!("  delays ({}):", snapshot.delays.len());
        for delay in &snapshot.delays {
            println!(
                "    - {:<20} date {}  margin {}  initial margin {}",
                delay.id,
                delay.date,
                format_margin(delay.margin),
                format_margin(delay.initial_margin)
            );
        }
    }
    println!();
}

fn format_margin(margin: Option<i64>) -> String {
    margin.map_or_else(|| "-".to_string(), |m| m.to_string())
}

/// Simple dry-run output: print projects, tasks and relations.
fn print_dry_run(plan: &PlanFile) {
    println!("plandag dry-run");
    println!();

    for planned in &plan.projects {
        let batch = &planned.batch;
        println!("project {} ({})", planned.definition.id, planned.definition.name);

        println!("  tasks ({}):", batch.tasks.len());
        for task in &batch.tasks {
            println!(
                "    - {}  start {}  duration {}",
                task.id, task.estimated_start_date, task.estimated_duration
            );
        }
        for relation in &batch.relations {
            println!(
                "    {} ({:?}) -> {}  lag {}",
                relation.previous, relation.previous_location, relation.next, relation.lag
            );
        }
        if !batch.delays.is_empty() {
            println!("  delays ({}):", batch.delays.len());
            for delay in &batch.delays {
                println!("    - {}  date {}", delay.id, delay.date);
            }
        }
        if !batch.modifiers.is_empty() {
            println!("  modifiers ({}):", batch.modifiers.len());
            for entry in &batch.modifiers {
                println!("    - {}  {:+} days", entry.task, entry.modifier.duration);
            }
        }
        println!();
    }

    debug!("dry-run complete (no schedule computed)");
}
