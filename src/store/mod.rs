// src/store/mod.rs

//! Persistence boundary.
//!
//! The graph never talks to a database directly; it goes through a
//! [`ProjectStore`]. Every call is an async suspension point, and every
//! mutation in [`crate::project`] awaits the store write before touching
//! the in-memory graph.
//!
//! - [`memory::MemoryStore`] keeps everything in process. It backs the CLI
//!   and the tests.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::types::{
    DelayDefinition, DelayRelation, EntityKind, Modifier, ModifierId, NewModifier,
    ProjectDefinition, TaskDefinition, TaskRelation,
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Boxed future returned by every [`ProjectStore`] call.
///
/// The future may only borrow the store itself; implementations copy any
/// borrowed arguments they need before returning.
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = std::result::Result<T, StoreError>> + Send + 'a>>;

/// Persistence collaborator consumed by the graph.
///
/// Ids are scoped by project. Lookups of unknown ids fail with
/// [`StoreError::NotFound`].
pub trait ProjectStore: Send + Sync + Debug {
    fn get_projects(&self) -> StoreFuture<'_, Vec<ProjectDefinition>>;
    fn add_project(&self, project: ProjectDefinition) -> StoreFuture<'_, ProjectDefinition>;

    fn get_project_tasks(&self, project: &str) -> StoreFuture<'_, Vec<TaskDefinition>>;
    fn get_task(&self, project: &str, task: &str) -> StoreFuture<'_, TaskDefinition>;
    fn add_task(&self, project: &str, task: TaskDefinition) -> StoreFuture<'_, TaskDefinition>;

    fn get_project_delays(&self, project: &str) -> StoreFuture<'_, Vec<DelayDefinition>>;
    fn get_delay(&self, project: &str, delay: &str) -> StoreFuture<'_, DelayDefinition>;
    fn add_delay(&self, project: &str, delay: DelayDefinition)
    -> StoreFuture<'_, DelayDefinition>;

    /// Modifiers associated with `task`, in association order.
    fn get_task_modifiers(&self, project: &str, task: &str) -> StoreFuture<'_, Vec<Modifier>>;
    /// Persist a modifier; the store assigns its id.
    fn add_modifier(&self, project: &str, modifier: NewModifier) -> StoreFuture<'_, Modifier>;
    fn add_modifier_for_task(
        &self,
        project: &str,
        task: &str,
        modifier: ModifierId,
    ) -> StoreFuture<'_, ()>;

    /// Relations whose `previous` end is `task`.
    fn get_task_relations(&self, project: &str, task: &str) -> StoreFuture<'_, Vec<TaskRelation>>;
    fn add_task_relation(
        &self,
        project: &str,
        relation: TaskRelation,
    ) -> StoreFuture<'_, TaskRelation>;

    /// Relations bound to `delay`.
    fn get_delay_relations(
        &self,
        project: &str,
        delay: &str,
    ) -> StoreFuture<'_, Vec<DelayRelation>>;
    fn add_delay_relation(
        &self,
        project: &str,
        relation: DelayRelation,
    ) -> StoreFuture<'_, DelayRelation>;
}
