use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::status::StageStatus;
use crate::store::StageRecordStore;
use crate::task::{Owner, TaskType};

/// Everything a concrete stage needs to do its work for one owner on one
/// effective date: the record store it advances and the date the cadence
/// gate computed.
pub struct StageContext {
    pub owner: Owner,
    pub effective_date: NaiveDate,
    pub record_store: Arc<dyn StageRecordStore>,
}

/// One step in a multi-phase pipeline. Concrete stages implement only the
/// work itself; the cadence gate, prerequisite handling, and task bookkeeping
/// live in `stagehand_core::runner::run`.
#[async_trait]
pub trait Stage: Send + Sync {
    fn task_type(&self) -> TaskType;

    /// Minimum business-day spacing between successful runs on the same
    /// owner. `0` means the stage may run at most once per day.
    fn interval_days(&self) -> i64 {
        0
    }

    /// Advisory: a task is considered recoverable from a crashed worker once
    /// `now - last_update >= task_timeout_secs`. Not enforced directly by the
    /// scheduler; documents the recovery latency implied by oldest-first
    /// picking.
    fn task_timeout_secs(&self) -> u64 {
        600
    }

    /// Advisory minimum back-off applied after a non-success outcome.
    fn task_retry_period_secs(&self) -> u64 {
        30
    }

    /// Validation or setup that must succeed before `start` runs. Default is
    /// a no-op; failures here are reported as `StageStatus::Failure` without
    /// mutating the stage record.
    async fn pre_run(&self, _ctx: &StageContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Do the work. Implementations are responsible for creating/advancing
    /// the `StageRecord` via `ctx.record_store` before returning `Success`.
    async fn start(&self, ctx: &StageContext) -> anyhow::Result<StageStatus>;
}
