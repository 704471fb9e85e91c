// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::project::ImportBatch;
use crate::types::{Location, ProjectDefinition};

/// Plan file as read from TOML, before validation.
///
/// ```toml
/// [project.launch]
/// name = "Website launch"
///
/// [project.launch.task.design]
/// start = "2016-10-01"
/// duration = 30
///
/// [project.launch.task.build]
/// start = "2016-10-15"
/// duration = 15
///
/// [[project.launch.relation]]
/// previous = "design"
/// next = "build"
/// anchor = "end"
/// lag = 0
///
/// [project.launch.delay.go-live]
/// date = "2016-12-01"
///
/// [[project.launch.delay_relation]]
/// delay = "go-live"
/// task = "build"
///
/// [[project.launch.modifier]]
/// task = "build"
/// duration = 3
/// ```
///
/// Dates are kept as strings here so that a malformed one surfaces as an
/// `InvalidDate` error naming the offending entry, not a TOML error.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlanFile {
    /// All projects from `[project.<id>]`, keyed by project id.
    #[serde(default)]
    pub project: BTreeMap<String, RawProjectConfig>,
}

/// `[project.<id>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProjectConfig {
    /// Defaults to the project id.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub task: BTreeMap<String, RawTaskConfig>,

    #[serde(default)]
    pub delay: BTreeMap<String, RawDelayConfig>,

    #[serde(default)]
    pub relation: Vec<RawRelationConfig>,

    #[serde(default)]
    pub delay_relation: Vec<RawDelayRelationConfig>,

    #[serde(default)]
    pub modifier: Vec<RawModifierConfig>,
}

/// `[project.<id>.task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Estimated start, `YYYY-MM-DD`.
    pub start: String,

    /// Estimated duration in whole days. Zero makes a milestone.
    #[serde(default)]
    pub duration: u32,
}

/// `[project.<id>.delay.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDelayConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Fixed deadline, `YYYY-MM-DD`.
    pub date: String,
}

/// `[[project.<id>.relation]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRelationConfig {
    pub previous: String,
    pub next: String,

    /// `"beginning"` or `"end"` of `previous`.
    #[serde(default)]
    pub anchor: Location,

    #[serde(default)]
    pub lag: i64,
}

/// `[[project.<id>.delay_relation]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDelayRelationConfig {
    pub delay: String,
    pub task: String,

    #[serde(default)]
    pub lag: i64,
}

/// `[[project.<id>.modifier]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawModifierConfig {
    pub task: String,
    pub duration: i64,

    #[serde(default)]
    pub description: String,
}

/// A validated plan file.
///
/// Built only through `TryFrom<RawPlanFile>`, so every date parsed, every
/// reference resolves, and every project's relations are acyclic.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub projects: Vec<PlannedProject>,
}

/// One project ready to be created and imported.
#[derive(Debug, Clone)]
pub struct PlannedProject {
    pub definition: ProjectDefinition,
    pub batch: ImportBatch,
}

impl PlanFile {
    pub(crate) fn new_unchecked(projects: Vec<PlannedProject>) -> Self {
        Self { projects }
    }

    pub fn project(&self, id: &str) -> Option<&PlannedProject> {
        self.projects.iter().find(|p| p.definition.id == id)
    }
}
