pub mod error;
pub mod stage;
pub mod stage_record;
pub mod status;
pub mod store;
pub mod task;

pub use error::{Error, Result};
pub use stage::{Stage, StageContext};
pub use stage_record::{StageRecord, StageState};
pub use status::StageStatus;
pub use store::{StageRecordStore, TaskStore};
pub use task::{Owner, Task, TaskType};

/// Owner sentinel for tasks that are global to a domain rather than scoped to
/// one partition (e.g. a cross-owner migration step).
pub const GLOBAL_OWNER: &str = "jp";
