// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::ProjectCommand;
use crate::project::{ProjectNode, TaskSnapshot};

/// Owns one [`ProjectNode`] and applies commands to it strictly in arrival
/// order, each one finished before the next is read.
pub struct ProjectRuntime {
    node: ProjectNode,
    command_rx: mpsc::Receiver<ProjectCommand>,
}

impl fmt::Debug for ProjectRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectRuntime")
            .field("project", &self.node.id())
            .finish_non_exhaustive()
    }
}

impl ProjectRuntime {
    pub fn new(node: ProjectNode, command_rx: mpsc::Receiver<ProjectCommand>) -> Self {
        Self { node, command_rx }
    }

    /// Main loop. Returns the node once every sender has been dropped.
    pub async fn run(mut self) -> ProjectNode {
        info!(project = %self.node.id(), "project runtime started");

        while let Some(command) = self.command_rx.recv().await {
            debug!(project = %self.node.id(), ?command, "project runtime received command");
            self.handle(command).await;
        }

        info!(project = %self.node.id(), "command channel closed; stopping project runtime");
        self.node
    }

    async fn handle(&mut self, command: ProjectCommand) {
        // A dropped reply receiver only means the caller stopped waiting;
        // the mutation itself has already been applied or rejected.
        match command {
            ProjectCommand::AddTask { task, reply } => {
                let result = self.node.add_task(task).await.map(TaskSnapshot::from);
                let _ = reply.send(result);
            }
            ProjectCommand::AddDelay { delay, reply } => {
                let result = self.node.add_delay(delay).await.map(|_| ());
                let _ = reply.send(result);
            }
            ProjectCommand::AddTaskRelation { relation, reply } => {
                let _ = reply.send(self.node.add_task_relation(relation).await);
            }
            ProjectCommand::AddDelayRelation { relation, reply } => {
                let _ = reply.send(self.node.add_delay_relation(relation).await);
            }
            ProjectCommand::AddModifier {
                task,
                modifier,
                reply,
            } => {
                let _ = reply.send(self.node.add_modifier(&task, modifier).await);
            }
            ProjectCommand::Import { batch, reply } => {
                let _ = reply.send(self.node.import(batch).await);
            }
            ProjectCommand::Snapshot { reply } => {
                let _ = reply.send(self.node.snapshot());
            }
        }
    }
}
