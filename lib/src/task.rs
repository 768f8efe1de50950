use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The data partition a task acts on, e.g. a prefecture's English name, or
/// [`crate::GLOBAL_OWNER`] for tasks that are global to a domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Owner(pub String);

impl Owner {
    pub fn global() -> Self {
        Owner(crate::GLOBAL_OWNER.to_string())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Owner {
    fn from(value: &str) -> Self {
        Owner(value.to_string())
    }
}

impl From<String> for Owner {
    fn from(value: String) -> Self {
        Owner(value)
    }
}

/// The stage a task performs, scoped to a domain (e.g. `INGEST_BASIC`,
/// `MIGRATE`). Domains declare their own sets of task types; the scheduler
/// core only ever treats this as an opaque, comparable key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskType(pub String);

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskType {
    fn from(value: &str) -> Self {
        TaskType(value.to_string())
    }
}

impl From<String> for TaskType {
    fn from(value: String) -> Self {
        TaskType(value)
    }
}

/// One persistent unit of scheduled work, uniquely identified by
/// `(domain, task_type, owner)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub domain: String,
    pub task_type: TaskType,
    pub owner: Owner,
    /// Timestamp of the last lease attempt or completion. The scheduler's
    /// oldest-first picker orders on this column.
    pub last_update: chrono::DateTime<chrono::Utc>,
    /// The last business date this task completed successfully, if any.
    pub date: Option<NaiveDate>,
}

impl Task {
    pub fn key(&self) -> (&str, &TaskType, &Owner) {
        (&self.domain, &self.task_type, &self.owner)
    }
}
