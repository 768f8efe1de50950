/// Closed error type shared by the store and stage-execution boundaries.
///
/// Binaries convert this into `anyhow::Error` at the top level; library code
/// propagates it with `?`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(String),

    #[error("no task registered for domain={domain} task_type={task_type} owner={owner}")]
    UnknownTask {
        domain: String,
        task_type: String,
        owner: String,
    },

    #[error("unknown domain: {0}")]
    UnknownDomain(String),
}

pub type Result<T> = std::result::Result<T, Error>;
