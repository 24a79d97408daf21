use serde::Serialize;

use crate::store::TaskStore;
use crate::task::{Priority, Task};

/// Open-task counts per priority. Completed tasks are never counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl Stats {
    pub fn collect<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut stats = Self::default();
        for task in tasks.into_iter().filter(|t| !t.is_completed()) {
            match task.priority() {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
            stats.total += 1;
        }
        stats
    }

    pub fn count(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

#[tracing::instrument(skip(store))]
pub fn stats(store: &TaskStore) -> Stats {
    Stats::collect(store.tasks())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Stats, stats};
    use crate::store::TaskStore;
    use crate::task::{Priority, TaskId};

    #[test]
    fn empty_store_has_zero_counts() {
        assert_eq!(stats(&TaskStore::new()), Stats::default());
    }

    #[test]
    fn counts_only_open_tasks() {
        let now = Utc::now();
        let store = TaskStore::new()
            .create("a", Priority::High, now)
            .create("b", Priority::High, now)
            .create("c", Priority::Low, now)
            .create("d", Priority::Medium, now)
            .toggle_complete(TaskId::new(2))
            .toggle_complete(TaskId::new(4));

        let summary = stats(&store);
        assert_eq!(
            summary,
            Stats {
                high: 1,
                medium: 0,
                low: 1,
                total: 2,
            }
        );
        assert_eq!(
            summary.total,
            Priority::ALL.iter().map(|p| summary.count(*p)).sum::<usize>()
        );
    }
}
