use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single [`crate::Stage`] run, mirroring the four-way result
/// the scheduler needs to decide what happens to the owning task next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    /// Work completed; the task's business date was advanced.
    Success,
    /// The cadence gate found nothing due to run yet.
    NoWork,
    /// An upstream stage for this owner/date has not completed.
    NotReady,
    /// Work was attempted and failed.
    Failure,
}

impl StageStatus {
    pub fn is_success(self) -> bool {
        matches!(self, StageStatus::Success)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageStatus::Success => "SUCCESS",
            StageStatus::NoWork => "NO_WORK_TO_DO",
            StageStatus::NotReady => "NOT_READY_FOR_WORK",
            StageStatus::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

impl From<StageStatus> for i32 {
    fn from(value: StageStatus) -> Self {
        match value {
            StageStatus::Success => 1,
            StageStatus::NoWork => 0,
            StageStatus::NotReady => -1,
            StageStatus::Failure => -999,
        }
    }
}
