pub mod cli;
pub mod logging;

pub use cli::{parse_opts, Cli};
pub use logging::subscribe_log;

pub type HostResult<T> = anyhow::Result<T>;
