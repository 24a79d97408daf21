use tracing::debug;

use crate::config::Config;
use crate::stats::{Stats, stats};
use crate::store::TaskStore;
use crate::task::{Priority, Task};
use crate::view::{PriorityFilter, SortMode, ViewSpec, build_view};

/// The front end's state: the canonical store plus the three user selections.
/// Nothing here outlives the process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub store: TaskStore,
    pub selected: Priority,
    pub view: ViewSpec,
}

impl Session {
    #[tracing::instrument(skip(cfg))]
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let selected = cfg
            .get_parsed::<Priority>("default.priority")?
            .unwrap_or_default();
        let filter = cfg
            .get_parsed::<PriorityFilter>("default.filter")?
            .unwrap_or_default();
        let sort = cfg
            .get_parsed::<SortMode>("default.sort")?
            .unwrap_or_default();

        debug!(%selected, %filter, %sort, "session initialized");
        Ok(Self {
            store: TaskStore::new(),
            selected,
            view: ViewSpec { filter, sort },
        })
    }

    pub fn visible(&self) -> Vec<&Task> {
        build_view(&self.store, self.view)
    }

    pub fn stats(&self) -> Stats {
        stats(&self.store)
    }
}
