use std::future::ready;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use plandag::store::{MemoryStore, ProjectStore, StoreError, StoreFuture};
use plandag::types::{
    DelayDefinition, DelayRelation, Modifier, ModifierId, NewModifier, ProjectDefinition,
    TaskDefinition, TaskRelation,
};

/// A store that wraps a [`MemoryStore`] and fails on demand:
/// - `fail_next_writes(n)` makes the next `n` writes return a backend error
///   without touching the inner store.
/// - `fail_reads_for(project)` makes every read scoped to that project fail.
///
/// Clones share both the inner store and the failure switches.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_writes: Arc<AtomicUsize>,
    failing_project: Arc<Mutex<Option<String>>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn fail_reads_for(&self, project: &str) {
        *self.failing_project.lock().unwrap() = Some(project.to_string());
    }

    fn write_should_fail(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn read_should_fail(&self, project: &str) -> bool {
        self.failing_project.lock().unwrap().as_deref() == Some(project)
    }

    fn fail<'a, T: Send + 'a>(what: &str) -> StoreFuture<'a, T> {
        Box::pin(ready(Err(StoreError::Backend(format!("injected failure: {what}")))))
    }
}

impl ProjectStore for FlakyStore {
    fn get_projects(&self) -> StoreFuture<'_, Vec<ProjectDefinition>> {
        self.inner.get_projects()
    }

    fn add_project(&self, project: ProjectDefinition) -> StoreFuture<'_, ProjectDefinition> {
        if self.write_should_fail() {
            return Self::fail("add_project");
        }
        self.inner.add_project(project)
    }

    fn get_project_tasks(&self, project: &str) -> StoreFuture<'_, Vec<TaskDefinition>> {
        if self.read_should_fail(project) {
            return Self::fail("get_project_tasks");
        }
        self.inner.get_project_tasks(project)
    }

    fn get_task(&self, project: &str, task: &str) -> StoreFuture<'_, TaskDefinition> {
        if self.read_should_fail(project) {
            return Self::fail("get_task");
        }
        self.inner.get_task(project, task)
    }

    fn add_task(&self, project: &str, task: TaskDefinition) -> StoreFuture<'_, TaskDefinition> {
        if self.write_should_fail() {
            return Self::fail("add_task");
        }
        self.inner.add_task(project, task)
    }

    fn get_project_delays(&self, project: &str) -> StoreFuture<'_, Vec<DelayDefinition>> {
        if self.read_should_fail(project) {
            return Self::fail("get_project_delays");
        }
        self.inner.get_project_delays(project)
    }

    fn get_delay(&self, project: &str, delay: &str) -> StoreFuture<'_, DelayDefinition> {
        if self.read_should_fail(project) {
            return Self::fail("get_delay");
        }
        self.inner.get_delay(project, delay)
    }

    fn add_delay(
        &self,
        project: &str,
        delay: DelayDefinition,
    ) -> StoreFuture<'_, DelayDefinition> {
        if self.write_should_fail() {
            return Self::fail("add_delay");
        }
        self.inner.add_delay(project, delay)
    }

    fn get_task_modifiers(&self, project: &str, task: &str) -> StoreFuture<'_, Vec<Modifier>> {
        if self.read_should_fail(project) {
            return Self::fail("get_task_modifiers");
        }
        self.inner.get_task_modifiers(project, task)
    }

    fn add_modifier(&self, project: &str, modifier: NewModifier) -> StoreFuture<'_, Modifier> {
        if self.write_should_fail() {
            return Self::fail("add_modifier");
        }
        self.inner.add_modifier(project, modifier)
    }

    fn add_modifier_for_task(
        &self,
        project: &str,
        task: &str,
        modifier: ModifierId,
    ) -> StoreFuture<'_, ()> {
        if self.write_should_fail() {
            return Self::fail("add_modifier_for_task");
        }
        self.inner.add_modifier_for_task(project, task, modifier)
    }

    fn get_task_relations(&self, project: &str, task: &str) -> StoreFuture<'_, Vec<TaskRelation>> {
        if self.read_should_fail(project) {
            return Self::fail("get_task_relations");
        }
        self.inner.get_task_relations(project, task)
    }

    fn add_task_relation(
        &self,
        project: &str,
        relation: TaskRelation,
    ) -> StoreFuture<'_, TaskRelation> {
        if self.write_should_fail() {
            return Self::fail("add_task_relation");
        }
        self.inner.add_task_relation(project, relation)
    }

    fn get_delay_relations(
        &self,
        project: &str,
        delay: &str,
    ) -> StoreFuture<'_, Vec<DelayRelation>> {
        if self.read_should_fail(project) {
            return Self::fail("get_delay_relations");
        }
        self.inner.get_delay_relations(project, delay)
    }

    fn add_delay_relation(
        &self,
        project: &str,
        relation: DelayRelation,
    ) -> StoreFuture<'_, DelayRelation> {
        if self.write_should_fail() {
            return Self::fail("add_delay_relation");
        }
        self.inner.add_delay_relation(project, relation)
    }
}
