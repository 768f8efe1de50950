use std::process::ExitCode;
use std::sync::Arc;

use stagehand_host::{parse_opts, subscribe_log};
use stagehand_lib::{StageRecordStore, TaskStore};
use stagehand_runtime::Scheduler;
use stagehand_tasks::{InMemoryStageRecordStore, InMemoryTaskStore};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let opts = match parse_opts() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("failed to parse arguments: {e}");
            return ExitCode::from(2);
        }
    };

    let _guard = subscribe_log(&opts.log_path, &opts.log_level, opts.max_log);
    info!(mode = %opts.mode, domain = %opts.domain, threads = opts.threads, "starting");

    match opts.mode.as_str() {
        "web" => {
            // A real HTTP read API is out of scope for this build; this mode
            // exists so deployment tooling (APP_MODE=web) has a defined,
            // non-crashing target.
            info!("web mode is a stub: no HTTP API is served in this build");
            ExitCode::SUCCESS
        }
        "scheduler" => run_scheduler(opts).await,
        other => {
            error!(mode = other, "unrecognized mode");
            ExitCode::from(2)
        }
    }
}

async fn run_scheduler(opts: stagehand_host::Cli) -> ExitCode {
    let runners = match stagehand_stages::domain_runners_for(&opts.domain) {
        Ok(runners) => runners,
        Err(err) => {
            error!(error = %err, known = ?stagehand_stages::KNOWN_DOMAINS, "unknown domain");
            return ExitCode::from(2);
        }
    };

    let (task_store, record_store) = match open_stores().await {
        Ok(stores) => stores,
        Err(e) => {
            error!(error = %e, "failed to open stores");
            return ExitCode::FAILURE;
        }
    };

    let scheduler = Scheduler::new(opts.threads, task_store, record_store, Arc::new(runners));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    match scheduler.run_until_shutdown(shutdown_rx).await {
        Ok(()) => {
            info!("shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "scheduler exited with an error");
            ExitCode::FAILURE
        }
    }
}

/// Open the task store and stage-record store. Uses MySQL when `TASK_DB_HOST`
/// is set (see `stagehand_tasks::MySqlConfig::from_env`), otherwise falls
/// back to the in-memory stores so the binary runs without a database for
/// local development.
async fn open_stores() -> anyhow::Result<(Arc<dyn TaskStore>, Arc<dyn StageRecordStore>)> {
    if std::env::var("TASK_DB_HOST").is_err() {
        info!("TASK_DB_HOST not set, using in-memory stores");
        return Ok((
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(InMemoryStageRecordStore::new()),
        ));
    }

    #[cfg(feature = "mysql")]
    {
        use stagehand_tasks::{open_pool, MySqlConfig, MySqlStageRecordStore, MySqlTaskStore};

        let task_db_config = MySqlConfig::from_env("TASK_DB")?;
        let task_pool = open_pool(&task_db_config).await?;

        let app_db_config = MySqlConfig::from_env("APP_DB").unwrap_or(task_db_config);
        let app_pool = open_pool(&app_db_config).await?;

        let domain = std::env::var("SCHEDULER_DOMAIN").unwrap_or_else(|_| "jpost".to_string());
        let table = format!("{domain}_stage_record");

        return Ok((
            Arc::new(MySqlTaskStore::new(task_pool)),
            Arc::new(MySqlStageRecordStore::new(app_pool, table)),
        ));
    }

    #[cfg(not(feature = "mysql"))]
    anyhow::bail!("TASK_DB_HOST is set but this binary was built without the mysql feature");
}
