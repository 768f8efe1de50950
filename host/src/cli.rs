use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

fn default_mode() -> String {
    "scheduler".to_string()
}

fn default_scheduler() -> String {
    "jpost".to_string()
}

fn default_threads() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    10
}

/// Process entry configuration, combining CLI flags and environment
/// variables the way the rest of the stack layers config: clap owns parsing
/// and `env = "..."` fallbacks, `#[serde(default = ...)]` keeps the same
/// struct usable when constructed programmatically (e.g. in tests).
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(author, version, about = "Stage scheduler and pipeline runtime")]
pub struct Cli {
    /// Process role: `scheduler` runs the worker pool, `web` would serve the
    /// read API (out of scope in this build; the flag is still honored so
    /// deployment tooling doesn't need special-casing).
    #[arg(long, env = "APP_MODE", default_value = "scheduler")]
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Domain to schedule: `jpost` or `manhole_card`.
    #[arg(short = 's', long = "scheduler", default_value = "jpost")]
    #[serde(default = "default_scheduler")]
    pub domain: String,

    /// Worker pool size.
    #[arg(short = 't', long = "threads", env = "SCHEDULER_THREADS", default_value_t = 5)]
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// `tracing_subscriber::EnvFilter` directive.
    #[arg(long = "log-level", env = "RUST_LOG", default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory to write rolling JSON log files to. Stdout logging always
    /// happens regardless of this setting.
    #[arg(long = "log-path")]
    pub log_path: Option<PathBuf>,

    #[arg(long = "max-log", default_value_t = 10)]
    #[serde(default = "default_max_log_files")]
    pub max_log: usize,
}

pub fn parse_opts() -> anyhow::Result<Cli> {
    Ok(Cli::parse())
}
