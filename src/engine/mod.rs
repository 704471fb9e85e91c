// src/engine/mod.rs

//! Per-project serialisation.
//!
//! A [`ProjectNode`](crate::project::ProjectNode) applies each mutation as
//! persist-then-commit, but two mutations on the same project can still
//! interleave their persist and commit steps. The engine removes that
//! window: each project is owned by a [`ProjectRuntime`] task that pulls
//! [`ProjectCommand`]s off a channel and runs them one at a time.
//! Callers talk to it through a cloneable [`ProjectHandle`].

use tokio::sync::oneshot;

use crate::errors::Result;
use crate::project::{ImportBatch, ImportSummary, ProjectSnapshot, TaskSnapshot};
use crate::types::{
    DelayDefinition, DelayRelation, Modifier, NewModifier, TaskDefinition, TaskId, TaskRelation,
};

/// Reply channel carried by every command.
pub type Reply<T> = oneshot::Sender<Result<T>>;

/// Requests flowing into a project runtime.
#[derive(Debug)]
pub enum ProjectCommand {
    AddTask {
        task: TaskDefinition,
        reply: Reply<TaskSnapshot>,
    },
    AddDelay {
        delay: DelayDefinition,
        reply: Reply<()>,
    },
    AddTaskRelation {
        relation: TaskRelation,
        reply: Reply<()>,
    },
    AddDelayRelation {
        relation: DelayRelation,
        reply: Reply<()>,
    },
    AddModifier {
        task: TaskId,
        modifier: NewModifier,
        reply: Reply<Modifier>,
    },
    Import {
        batch: ImportBatch,
        reply: Reply<ImportSummary>,
    },
    Snapshot {
        reply: oneshot::Sender<ProjectSnapshot>,
    },
}

pub mod handle;
pub mod runtime;

pub use handle::ProjectHandle;
pub use runtime::ProjectRuntime;
