// src/project/mod.rs

//! Project-level orchestration on top of the [`crate::dag`] core.
//!
//! - [`graph`] is the registry of projects (`load`, `add_project`).
//! - [`node`] wraps one project's schedule with the persist-then-commit
//!   mutation API and the staged load pipeline.
//! - [`import`] describes bulk import batches and their pre-checks.
//! - [`snapshot`] provides owned views of computed schedules.

pub mod graph;
pub mod import;
pub mod node;
pub mod snapshot;

pub use graph::ProjectGraph;
pub use import::{ImportBatch, ImportSummary, TaskModifier};
pub use node::ProjectNode;
pub use snapshot::{DelaySnapshot, ProjectSnapshot, TaskSnapshot};
