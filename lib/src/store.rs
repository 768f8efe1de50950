use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::stage_record::{StageRecord, StageState};
use crate::task::{Owner, Task, TaskType};

/// Persistent task roster plus the lease primitive the scheduler uses to
/// arbitrate which worker gets to run a given `(domain, task_type, owner)`.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert the task if it does not already exist; idempotent.
    async fn ensure_task(&self, domain: &str, task_type: &TaskType, owner: &Owner)
        -> Result<Task>;

    /// Return the task with the smallest `last_update` in this domain.
    async fn pick_oldest(&self, domain: &str) -> Result<Option<Task>>;

    /// Conditionally advance `last_update` to now, iff the row's current
    /// value still equals `observed_last_update`. Returns whether the lease
    /// was acquired.
    async fn lease(&self, task_id: i64, observed_last_update: DateTime<Utc>) -> Result<bool>;

    /// Record a completed run's business date. Only the worker that holds
    /// the lease should call this.
    async fn complete(&self, task_id: i64, date: NaiveDate) -> Result<()>;
}

/// Per-`(owner, date)` progress rows and their CAS state transition.
#[async_trait]
pub trait StageRecordStore: Send + Sync {
    async fn get(&self, owner: &Owner, date: NaiveDate) -> Result<Option<StageRecord>>;

    /// Insert a new `CREATED` record. Callers must handle the race of a
    /// concurrent create by re-reading via `get`.
    async fn create(&self, owner: &Owner, date: NaiveDate) -> Result<StageRecord>;

    /// Conditionally transition `id` from `expected` to `new_state`.
    async fn cas_state(&self, id: i64, expected: StageState, new_state: StageState)
        -> Result<bool>;
}
