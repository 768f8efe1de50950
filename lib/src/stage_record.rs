use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress state for one `(owner, date)` pair moving through a domain's
/// multi-stage pipeline. Transitions are strictly monotonic in the order
/// declared here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageState {
    Created,
    Basic,
    Detailed,
    Located,
    Finished,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageState::Created => "CREATED",
            StageState::Basic => "BASIC",
            StageState::Detailed => "DETAILED",
            StageState::Located => "LOCATED",
            StageState::Finished => "FINISHED",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized stage state: {0}")]
pub struct ParseStageStateError(String);

impl FromStr for StageState {
    type Err = ParseStageStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(StageState::Created),
            "BASIC" => Ok(StageState::Basic),
            "DETAILED" => Ok(StageState::Detailed),
            "LOCATED" => Ok(StageState::Located),
            "FINISHED" => Ok(StageState::Finished),
            other => Err(ParseStageStateError(other.to_string())),
        }
    }
}

/// A per-`(owner, date)` row tracking how far a pipeline has advanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: i64,
    pub owner: String,
    pub date: NaiveDate,
    pub state: StageState,
    pub created_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ordering_is_monotonic() {
        assert!(StageState::Created < StageState::Basic);
        assert!(StageState::Basic < StageState::Detailed);
        assert!(StageState::Detailed < StageState::Located);
        assert!(StageState::Located < StageState::Finished);
    }

    #[test]
    fn round_trips_through_string_form() {
        for state in [
            StageState::Created,
            StageState::Basic,
            StageState::Detailed,
            StageState::Located,
            StageState::Finished,
        ] {
            let parsed: StageState = state.as_str().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }
}
