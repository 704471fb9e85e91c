// src/project/graph.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;

use super::node::ProjectNode;
use crate::errors::{GraphError, Result};
use crate::store::ProjectStore;
use crate::types::{EntityKind, ProjectDefinition, ProjectId};

/// Registry of every loaded project, keyed by project id.
#[derive(Debug)]
pub struct ProjectGraph {
    store: Arc<dyn ProjectStore>,
    projects: BTreeMap<ProjectId, ProjectNode>,
}

impl ProjectGraph {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            store,
            projects: BTreeMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ProjectStore> {
        &self.store
    }

    /// Load every persisted project.
    ///
    /// Projects load concurrently; if any of them fails the whole call
    /// fails and the registry is left as it was.
    pub async fn load(&mut self) -> Result<()> {
        let definitions = self.store.get_projects().await?;

        let mut nodes: Vec<ProjectNode> = definitions
            .into_iter()
            .map(|definition| ProjectNode::new(definition, Arc::clone(&self.store)))
            .collect();
        try_join_all(nodes.iter_mut().map(ProjectNode::load)).await?;

        let mut projects = BTreeMap::new();
        for node in nodes {
            let id = node.id().to_string();
            if projects.contains_key(&id) {
                return Err(GraphError::exists(EntityKind::Project, id));
            }
            projects.insert(id, node);
        }

        info!(projects = projects.len(), "project graph loaded");
        self.projects = projects;
        Ok(())
    }

    /// Persist and register a new, empty project.
    pub async fn add_project(&mut self, definition: ProjectDefinition) -> Result<&mut ProjectNode> {
        if self.projects.contains_key(&definition.id) {
            return Err(GraphError::exists(EntityKind::Project, definition.id));
        }

        let stored = self.store.add_project(definition).await?;
        info!(project = %stored.id, "project added");

        let id = stored.id.clone();
        let node = ProjectNode::new(stored, Arc::clone(&self.store));
        Ok(self.projects.entry(id).or_insert(node))
    }

    pub fn project(&self, id: &str) -> Option<&ProjectNode> {
        self.projects.get(id)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut ProjectNode> {
        self.projects.get_mut(id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectNode> {
        self.projects.values()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Hand out the loaded projects, e.g. to wrap each in a
    /// [`ProjectHandle`](crate::engine::ProjectHandle).
    pub fn into_projects(self) -> BTreeMap<ProjectId, ProjectNode> {
        self.projects
    }
}
