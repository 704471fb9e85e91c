// src/config/mod.rs

//! Plan file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Turn it into import batches, checking dates, references and cycles
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_plan_path, load_and_validate, load_from_path};
pub use model::{
    PlanFile, PlannedProject, RawDelayConfig, RawDelayRelationConfig, RawModifierConfig,
    RawPlanFile, RawProjectConfig, RawRelationConfig, RawTaskConfig,
};
