// src/dag/mod.rs

//! Scheduling graph core.
//!
//! - [`schedule`] is the arena that owns every task and delay node of a
//!   project and runs recomputation after each structural change.
//! - [`task_node`] holds one task's live start/duration and its edges.
//! - [`delay_node`] tracks margins of tasks bound to a fixed deadline.
//! - [`propagation`] contains the explicit-stack traversals used for
//!   topological recomputation and reachability.
//! - [`analyzer`] is the stateless cycle pre-check for bulk imports.

pub mod analyzer;
pub mod delay_node;
pub mod propagation;
pub mod schedule;
pub mod task_node;

pub use analyzer::{ensure_acyclic, ensure_batch_acyclic};
pub use delay_node::{DelayBinding, DelayNode};
pub use schedule::Schedule;
pub use task_node::{Edge, TaskNode, add_days, days_between};
