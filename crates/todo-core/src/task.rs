use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Display metadata for a priority level. `rank` only drives sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityLevel {
    pub label: &'static str,
    pub rank: u8,
}

impl Priority {
    /// All levels, highest first.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub const fn level(self) -> PriorityLevel {
        match self {
            Self::High => PriorityLevel {
                label: "High",
                rank: 3,
            },
            Self::Medium => PriorityLevel {
                label: "Medium",
                rank: 2,
            },
            Self::Low => PriorityLevel {
                label: "Low",
                rank: 1,
            },
        }
    }

    pub const fn rank(self) -> u8 {
        self.level().rank
    }

    pub const fn label(self) -> &'static str {
        self.level().label
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Self::High),
            "medium" | "m" => Ok(Self::Medium),
            "low" | "l" => Ok(Self::Low),
            other => Err(anyhow!(
                "invalid priority: {other} (expected high, medium or low)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| anyhow!("invalid task id: {s}"))
    }
}

/// A single entry in the list. Only the store constructs or changes these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    text: String,
    completed: bool,
    priority: Priority,
    created_at: DateTime<Utc>,
}

impl Task {
    pub(crate) fn new_incomplete(
        id: TaskId,
        text: String,
        priority: Priority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text,
            completed: false,
            priority,
            created_at,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }

    pub(crate) fn with_priority(&self, priority: Priority) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{Priority, Task, TaskId};

    #[test]
    fn ranks_follow_level_order() {
        assert_eq!(Priority::High.rank(), 3);
        assert_eq!(Priority::Medium.rank(), 2);
        assert_eq!(Priority::Low.rank(), 1);
        assert!(
            Priority::ALL
                .windows(2)
                .all(|pair| pair[0].rank() > pair[1].rank())
        );
    }

    #[test]
    fn parses_keys_and_short_forms() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" medium ".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("l".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert!("".parse::<Priority>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for priority in Priority::ALL {
            assert_eq!(
                priority.to_string().parse::<Priority>().unwrap(),
                priority
            );
        }
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::Low.label(), "Low");
    }

    #[test]
    fn task_serializes_with_camel_case_keys() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let task = Task::new_incomplete(
            TaskId::new(7),
            "Call mom".to_string(),
            Priority::Medium,
            now,
        );

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["text"], "Call mom");
        assert_eq!(value["completed"], false);
        assert_eq!(value["priority"], "medium");
        assert!(value["createdAt"].is_string());
    }

    #[test]
    fn toggled_flips_only_completion() {
        let now = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        let task = Task::new_incomplete(TaskId::new(1), "x".to_string(), Priority::Low, now);
        let done = task.toggled();

        assert!(done.is_completed());
        assert_eq!(done.text(), task.text());
        assert_eq!(done.priority(), task.priority());
        assert_eq!(done.toggled(), task);
    }
}
