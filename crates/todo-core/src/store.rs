use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::task::{Priority, Task, TaskId};

/// Canonical task collection.
///
/// Every mutation returns a new store and leaves `self` untouched. Tasks are
/// keyed by id; the id counter lives in the value so that two stores derived
/// from the same lineage never hand out the same id twice, even across
/// deletions or tasks created within the same instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, Task>,
    next_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new incomplete task. Blank text leaves the store unchanged.
    #[must_use]
    #[tracing::instrument(skip(self, text, now), fields(priority = %priority))]
    pub fn create(&self, text: &str, priority: Priority, now: DateTime<Utc>) -> Self {
        if text.trim().is_empty() {
            debug!("rejected blank task text");
            return self.clone();
        }

        let id = TaskId::new(self.next_id + 1);
        let mut next = self.clone();
        next.next_id = id.get();
        next.tasks.insert(
            id,
            Task::new_incomplete(id, text.to_string(), priority, now),
        );

        debug!(id = %id, count = next.tasks.len(), "task created");
        next
    }

    #[must_use]
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn toggle_complete(&self, id: TaskId) -> Self {
        self.replace_with(id, Task::toggled)
    }

    #[must_use]
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete(&self, id: TaskId) -> Self {
        if !self.tasks.contains_key(&id) {
            trace!("delete target not found");
            return self.clone();
        }

        let mut next = self.clone();
        next.tasks.remove(&id);
        debug!(count = next.tasks.len(), "task deleted");
        next
    }

    /// Completion state is not consulted; completed tasks can be reprioritized.
    #[must_use]
    #[tracing::instrument(skip(self), fields(id = %id, priority = %priority))]
    pub fn set_priority(&self, id: TaskId, priority: Priority) -> Self {
        self.replace_with(id, |task| task.with_priority(priority))
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Tasks in id order, which is also creation order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Most recently created task that still exists.
    pub fn last_created(&self) -> Option<&Task> {
        self.tasks.values().next_back()
    }

    fn replace_with<F>(&self, id: TaskId, f: F) -> Self
    where
        F: FnOnce(&Task) -> Task,
    {
        let Some(current) = self.tasks.get(&id) else {
            trace!("target task not found; store unchanged");
            return self.clone();
        };

        let updated = f(current);
        let mut next = self.clone();
        next.tasks.insert(id, updated);
        next
    }
}
