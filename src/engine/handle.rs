// src/engine/handle.rs

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{ProjectCommand, ProjectRuntime, Reply};
use crate::errors::{GraphError, Result};
use crate::project::{ImportBatch, ImportSummary, ProjectNode, ProjectSnapshot, TaskSnapshot};
use crate::types::{
    DelayDefinition, DelayRelation, Modifier, NewModifier, ProjectId, TaskDefinition,
    TaskRelation,
};

/// Commands that may wait for the runtime before `send` blocks.
const COMMAND_BUFFER: usize = 64;

/// Cloneable front door to one project's [`ProjectRuntime`].
///
/// All clones feed the same queue, so mutations issued through any of them
/// are applied one at a time in the order they were received.
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    project: ProjectId,
    command_tx: mpsc::Sender<ProjectCommand>,
}

impl ProjectHandle {
    /// Move `node` onto its own task.
    ///
    /// The join handle resolves to the node once every `ProjectHandle`
    /// clone has been dropped.
    pub fn spawn(node: ProjectNode) -> (Self, JoinHandle<ProjectNode>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let project = node.id().to_string();
        let join = tokio::spawn(ProjectRuntime::new(node, command_rx).run());
        (
            Self {
                project,
                command_tx,
            },
            join,
        )
    }

    pub fn project_id(&self) -> &str {
        &self.project
    }

    pub async fn add_task(&self, task: TaskDefinition) -> Result<TaskSnapshot> {
        self.request(|reply| ProjectCommand::AddTask { task, reply })
            .await
    }

    pub async fn add_delay(&self, delay: DelayDefinition) -> Result<()> {
        self.request(|reply| ProjectCommand::AddDelay { delay, reply })
            .await
    }

    pub async fn add_task_relation(&self, relation: TaskRelation) -> Result<()> {
        self.request(|reply| ProjectCommand::AddTaskRelation { relation, reply })
            .await
    }

    pub async fn add_delay_relation(&self, relation: DelayRelation) -> Result<()> {
        self.request(|reply| ProjectCommand::AddDelayRelation { relation, reply })
            .await
    }

    pub async fn add_modifier(
        &self,
        task: impl Into<String>,
        modifier: NewModifier,
    ) -> Result<Modifier> {
        let task = task.into();
        self.request(|reply| ProjectCommand::AddModifier {
            task,
            modifier,
            reply,
        })
        .await
    }

    pub async fn import(&self, batch: ImportBatch) -> Result<ImportSummary> {
        self.request(|reply| ProjectCommand::Import { batch, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<ProjectSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(ProjectCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| self.stopped())
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> ProjectCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| self.stopped())?
    }

    async fn send(&self, command: ProjectCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| self.stopped())
    }

    fn stopped(&self) -> GraphError {
        GraphError::Other(anyhow!("runtime for project '{}' has stopped", self.project))
    }
}
