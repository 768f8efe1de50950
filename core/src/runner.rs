use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use stagehand_lib::{Stage, StageContext, StageRecordStore, StageStatus, Task, TaskStore};

/// Compute the effective run date for a stage given its last completed date
/// and cadence policy.
///
/// `None` means the cadence gate is closed and the caller should report
/// `NoWork` without touching any stores. The comparison is strict (`<`, not
/// `<=`): an `interval_days = 0` stage may run at most once per calendar
/// day, and an `interval_days = N > 0` stage runs at most once every N+1
/// days. This mirrors the original scheduler's date arithmetic exactly.
pub fn effective_date(
    today: NaiveDate,
    last_completed: Option<NaiveDate>,
    interval_days: i64,
) -> Option<NaiveDate> {
    match last_completed {
        None => Some(today),
        Some(last) => {
            let next_run_date = last + Duration::days(interval_days);
            if next_run_date < today {
                Some(today)
            } else {
                None
            }
        }
    }
}

/// Run one stage against one leased task: gate on cadence, call the stage's
/// hooks, and persist the outcome. This is the single place the four
/// `StageStatus` outcomes are produced and logged; concrete stages only ever
/// return a status from `start`.
pub async fn run(
    stage: &dyn Stage,
    task: &Task,
    task_store: &dyn TaskStore,
    record_store: Arc<dyn StageRecordStore>,
) -> StageStatus {
    let today = Utc::now().date_naive();
    let Some(date) = effective_date(today, task.date, stage.interval_days()) else {
        tracing::debug!(
            task_type = %task.task_type,
            owner = %task.owner,
            "NO_WORK_TO_DO: cadence gate closed"
        );
        return StageStatus::NoWork;
    };

    let ctx = StageContext {
        owner: task.owner.clone(),
        effective_date: date,
        record_store,
    };

    if let Err(err) = stage.pre_run(&ctx).await {
        tracing::error!(
            task_type = %task.task_type,
            owner = %task.owner,
            error = %err,
            "FAILURE: pre_run failed"
        );
        return StageStatus::Failure;
    }

    let status = match stage.start(&ctx).await {
        Ok(status) => status,
        Err(err) => {
            tracing::error!(
                task_type = %task.task_type,
                owner = %task.owner,
                error = %err,
                "FAILURE: start failed"
            );
            StageStatus::Failure
        }
    };

    if status.is_success() {
        if let Err(err) = task_store.complete(task.id, date).await {
            // Non-fatal: the stage's own record-store CAS already persisted
            // the real progress. Losing this bookkeeping update only delays
            // the next cadence window, it cannot corrupt state.
            tracing::warn!(
                task_type = %task.task_type,
                owner = %task.owner,
                error = %err,
                "failed to persist task completion date"
            );
        }
    }

    tracing::info!(
        status = %status,
        task_type = %task.task_type,
        owner = %task.owner,
        date = %date,
        "stage run finished"
    );

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_run_has_no_last_completed_date() {
        let today = date(2026, 7, 31);
        assert_eq!(effective_date(today, None, 0), Some(today));
    }

    #[test]
    fn zero_interval_runs_at_most_once_per_day() {
        let today = date(2026, 7, 31);
        assert_eq!(effective_date(today, Some(today), 0), None);
        assert_eq!(effective_date(today, Some(date(2026, 7, 30)), 0), Some(today));
    }

    #[test]
    fn positive_interval_uses_strict_less_than() {
        let last = date(2026, 7, 1);
        // next_run_date = 2026-07-04; today == next_run_date -> still gated.
        assert_eq!(effective_date(date(2026, 7, 4), Some(last), 3), None);
        // today strictly after next_run_date -> opens.
        assert_eq!(
            effective_date(date(2026, 7, 5), Some(last), 3),
            Some(date(2026, 7, 5))
        );
    }
}
