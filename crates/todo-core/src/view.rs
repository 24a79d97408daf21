use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::trace;

use crate::store::TaskStore;
use crate::task::{
  Priority,
  Task
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum PriorityFilter {
  #[default]
  All,
  Only(Priority)
}

impl PriorityFilter {
  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    match self {
      | Self::All => true,
      | Self::Only(priority) => {
        task.priority() == *priority
      }
    }
  }
}

impl fmt::Display for PriorityFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::All => f.write_str("all"),
      | Self::Only(priority) => {
        write!(f, "{priority}")
      }
    }
  }
}

impl FromStr for PriorityFilter {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    if s.trim().eq_ignore_ascii_case("all")
    {
      return Ok(Self::All);
    }
    s.parse::<Priority>()
      .map(Self::Only)
      .map_err(|_| {
        anyhow!(
          "invalid filter: {s} \
           (expected all, high, \
           medium or low)"
        )
      })
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum SortMode {
  #[default]
  Priority,
  Created,
  Alphabetical
}

impl SortMode {
  pub const fn as_str(
    self
  ) -> &'static str {
    match self {
      | Self::Priority => "priority",
      | Self::Created => "created",
      | Self::Alphabetical => {
        "alphabetical"
      }
    }
  }
}

impl fmt::Display for SortMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SortMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "priority" | "pri" => {
        Ok(Self::Priority)
      }
      | "created" | "entry" => {
        Ok(Self::Created)
      }
      | "alphabetical" | "alpha"
      | "text" => {
        Ok(Self::Alphabetical)
      }
      | other => Err(anyhow!(
        "invalid sort mode: {other} \
         (expected priority, created \
         or alphabetical)"
      ))
    }
  }
}

/// Caller-held view selection.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct ViewSpec {
  pub filter: PriorityFilter,
  pub sort:   SortMode
}

/// Filters and orders the store for display.
///
/// Incomplete tasks always come before completed ones; `spec.sort` only
/// orders within those two groups. The sort is stable over id order, so
/// anything still tied keeps creation order.
#[tracing::instrument(skip(store))]
pub fn build_view(
  store: &TaskStore,
  spec: ViewSpec
) -> Vec<&Task> {
  let mut rows: Vec<&Task> = store
    .tasks()
    .filter(|task| {
      spec.filter.matches(task)
    })
    .collect();

  rows.sort_by(|a, b| {
    compare_tasks(a, b, spec.sort)
  });

  trace!(
    total = store.len(),
    shown = rows.len(),
    "built view"
  );
  rows
}

pub fn compare_tasks(
  a: &Task,
  b: &Task,
  sort: SortMode
) -> Ordering {
  a.is_completed()
    .cmp(&b.is_completed())
    .then_with(|| {
      compare_on_mode(a, b, sort)
    })
}

fn compare_on_mode(
  a: &Task,
  b: &Task,
  sort: SortMode
) -> Ordering {
  match sort {
    | SortMode::Priority => {
      b.priority()
        .rank()
        .cmp(&a.priority().rank())
    }
    | SortMode::Created => {
      b.created_at()
        .cmp(&a.created_at())
    }
    | SortMode::Alphabetical => {
      compare_text(a.text(), b.text())
    }
  }
}

fn compare_text(
  a: &str,
  b: &str
) -> Ordering {
  a.to_lowercase()
    .cmp(&b.to_lowercase())
    .then_with(|| a.cmp(b))
}
