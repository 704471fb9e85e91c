// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};
use std::future::ready;
use std::sync::{Arc, Mutex};

use super::{ProjectStore, StoreError, StoreFuture};
use crate::types::{
    DelayDefinition, DelayRelation, EntityKind, Modifier, ModifierId, NewModifier,
    ProjectDefinition, ProjectId, TaskDefinition, TaskId, TaskRelation,
};

#[derive(Debug, Clone)]
struct StoredProject {
    definition: ProjectDefinition,
    tasks: Vec<TaskDefinition>,
    delays: Vec<DelayDefinition>,
    task_relations: Vec<TaskRelation>,
    delay_relations: Vec<DelayRelation>,
    task_modifiers: HashMap<TaskId, Vec<ModifierId>>,
}

impl StoredProject {
    fn new(definition: ProjectDefinition) -> Self {
        Self {
            definition,
            tasks: Vec::new(),
            delays: Vec::new(),
            task_relations: Vec::new(),
            delay_relations: Vec::new(),
            task_modifiers: HashMap::new(),
        }
    }

    fn has_task(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    fn has_delay(&self, id: &str) -> bool {
        self.delays.iter().any(|d| d.id == id)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    /// Insertion-ordered; `get_projects` returns them in creation order.
    projects: Vec<StoredProject>,
    modifiers: BTreeMap<ModifierId, (ProjectId, Modifier)>,
    last_modifier_id: ModifierId,
}

impl StoreState {
    fn project(&self, id: &str) -> Result<&StoredProject, StoreError> {
        self.projects
            .iter()
            .find(|p| p.definition.id == id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))
    }

    fn project_mut(&mut self, id: &str) -> Result<&mut StoredProject, StoreError> {
        self.projects
            .iter_mut()
            .find(|p| p.definition.id == id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))
    }
}

/// In-process [`ProjectStore`].
///
/// Preserves insertion order for every list it returns and hands out
/// modifier ids starting at 1. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        f(&mut state)
    }

    fn respond<T: Send + 'static>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> StoreFuture<'_, T> {
        Box::pin(ready(self.with_state(f)))
    }
}

impl ProjectStore for MemoryStore {
    fn get_projects(&self) -> StoreFuture<'_, Vec<ProjectDefinition>> {
        self.respond(|state| {
            Ok(state
                .projects
                .iter()
                .map(|p| p.definition.clone())
                .collect())
        })
    }

    fn add_project(&self, project: ProjectDefinition) -> StoreFuture<'_, ProjectDefinition> {
        self.respond(move |state| {
            if state.project(&project.id).is_ok() {
                return Err(StoreError::Backend(format!(
                    "duplicate project id '{}'",
                    project.id
                )));
            }
            state.projects.push(StoredProject::new(project.clone()));
            Ok(project)
        })
    }

    fn get_project_tasks(&self, project: &str) -> StoreFuture<'_, Vec<TaskDefinition>> {
        self.respond(|state| Ok(state.project(project)?.tasks.clone()))
    }

    fn get_task(&self, project: &str, task: &str) -> StoreFuture<'_, TaskDefinition> {
        self.respond(|state| {
            state
                .project(project)?
                .tasks
                .iter()
                .find(|t| t.id == task)
                .cloned()
                .ok_or_else(|| StoreError::not_found(EntityKind::Task, task))
        })
    }

    fn add_task(&self, project: &str, task: TaskDefinition) -> StoreFuture<'_, TaskDefinition> {
        self.respond(move |state| {
            let stored = state.project_mut(project)?;
            if stored.has_task(&task.id) {
                return Err(StoreError::Backend(format!(
                    "duplicate task id '{}'",
                    task.id
                )));
            }
            stored.tasks.push(task.clone());
            Ok(task)
        })
    }

    fn get_project_delays(&self, project: &str) -> StoreFuture<'_, Vec<DelayDefinition>> {
        self.respond(|state| Ok(state.project(project)?.delays.clone()))
    }

    fn get_delay(&self, project: &str, delay: &str) -> StoreFuture<'_, DelayDefinition> {
        self.respond(|state| {
            state
                .project(project)?
                .delays
                .iter()
                .find(|d| d.id == delay)
                .cloned()
                .ok_or_else(|| StoreError::not_found(EntityKind::Delay, delay))
        })
    }

    fn add_delay(
        &self,
        project: &str,
        delay: DelayDefinition,
    ) -> StoreFuture<'_, DelayDefinition> {
        self.respond(move |state| {
            let stored = state.project_mut(project)?;
            if stored.has_delay(&delay.id) {
                return Err(StoreError::Backend(format!(
                    "duplicate delay id '{}'",
                    delay.id
                )));
            }
            stored.delays.push(delay.clone());
            Ok(delay)
        })
    }

    fn get_task_modifiers(&self, project: &str, task: &str) -> StoreFuture<'_, Vec<Modifier>> {
        self.respond(|state| {
            let stored = state.project(project)?;
            if !stored.has_task(task) {
                return Err(StoreError::not_found(EntityKind::Task, task));
            }
            let ids = stored.task_modifiers.get(task).cloned().unwrap_or_default();
            ids.iter()
                .map(|id| {
                    state
                        .modifiers
                        .get(id)
                        .map(|(_, m)| m.clone())
                        .ok_or_else(|| StoreError::not_found(EntityKind::Modifier, id.to_string()))
                })
                .collect()
        })
    }

    fn add_modifier(&self, project: &str, modifier: NewModifier) -> StoreFuture<'_, Modifier> {
        self.respond(move |state| {
            state.project(project)?;
            state.last_modifier_id += 1;
            let stored = Modifier {
                id: state.last_modifier_id,
                duration: modifier.duration,
                description: modifier.description,
            };
            state
                .modifiers
                .insert(stored.id, (project.to_string(), stored.clone()));
            Ok(stored)
        })
    }

    fn add_modifier_for_task(
        &self,
        project: &str,
        task: &str,
        modifier: ModifierId,
    ) -> StoreFuture<'_, ()> {
        self.respond(move |state| {
            match state.modifiers.get(&modifier) {
                Some((owner, _)) if owner == project => {}
                _ => {
                    return Err(StoreError::not_found(
                        EntityKind::Modifier,
                        modifier.to_string(),
                    ));
                }
            }
            let stored = state.project_mut(project)?;
            if !stored.has_task(task) {
                return Err(StoreError::not_found(EntityKind::Task, task));
            }
            stored
                .task_modifiers
                .entry(task.to_string())
                .or_default()
                .push(modifier);
            Ok(())
        })
    }

    fn get_task_relations(&self, project: &str, task: &str) -> StoreFuture<'_, Vec<TaskRelation>> {
        self.respond(|state| {
            let stored = state.project(project)?;
            if !stored.has_task(task) {
                return Err(StoreError::not_found(EntityKind::Task, task));
            }
            Ok(stored
                .task_relations
                .iter()
                .filter(|r| r.previous == task)
                .cloned()
                .collect())
        })
    }

    fn add_task_relation(
        &self,
        project: &str,
        relation: TaskRelation,
    ) -> StoreFuture<'_, TaskRelation> {
        self.respond(move |state| {
            let stored = state.project_mut(project)?;
            for id in [&relation.previous, &relation.next] {
                if !stored.has_task(id) {
                    return Err(StoreError::not_found(EntityKind::Task, id.as_str()));
                }
            }
            stored.task_relations.push(relation.clone());
            Ok(relation)
        })
    }

    fn get_delay_relations(
        &self,
        project: &str,
        delay: &str,
    ) -> StoreFuture<'_, Vec<DelayRelation>> {
        self.respond(|state| {
            let stored = state.project(project)?;
            if !stored.has_delay(delay) {
                return Err(StoreError::not_found(EntityKind::Delay, delay));
            }
            Ok(stored
                .delay_relations
                .iter()
                .filter(|r| r.delay == delay)
                .cloned()
                .collect())
        })
    }

    fn add_delay_relation(
        &self,
        project: &str,
        relation: DelayRelation,
    ) -> StoreFuture<'_, DelayRelation> {
        self.respond(move |state| {
            let stored = state.project_mut(project)?;
            if !stored.has_delay(&relation.delay) {
                return Err(StoreError::not_found(
                    EntityKind::Delay,
                    relation.delay.as_str(),
                ));
            }
            if !stored.has_task(&relation.task) {
                return Err(StoreError::not_found(
                    EntityKind::Task,
                    relation.task.as_str(),
                ));
            }
            stored.delay_relations.push(relation.clone());
            Ok(relation)
        })
    }
}
