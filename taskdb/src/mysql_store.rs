use std::time::Duration;

use async_trait::async_trait;
use backoff::{exponential::ExponentialBackoff, SystemClock};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool, Row};
use stagehand_lib::{Error, Owner, Result, StageRecord, StageRecordStore, StageState, Task, TaskStore, TaskType};

/// Connection settings for one logical MySQL database, read from a
/// `{PREFIX}_HOST` / `{PREFIX}_USER` / `{PREFIX}_PASSWORD` / `{PREFIX}_DATABASE`
/// / `{PREFIX}_PORT` group of environment variables. The task store and the
/// application store each get their own prefix (`TASK_DB`, `APP_DB`) since
/// they may be physically distinct databases.
#[derive(Debug, Clone)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl MySqlConfig {
    pub fn from_env(prefix: &str) -> anyhow::Result<Self> {
        let var = |suffix: &str| -> anyhow::Result<String> {
            std::env::var(format!("{prefix}_{suffix}"))
                .map_err(|_| anyhow::anyhow!("missing env var {prefix}_{suffix}"))
        };
        Ok(Self {
            host: var("HOST")?,
            port: std::env::var(format!("{prefix}_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3306),
            user: var("USER")?,
            password: var("PASSWORD")?,
            database: var("DATABASE")?,
        })
    }

    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// Open a pool with the same exponential-backoff retry the rest of the stack
/// uses for flaky external dependencies: a handful of attempts over a few
/// minutes before giving up.
pub async fn open_pool(config: &MySqlConfig) -> anyhow::Result<Pool<MySql>> {
    let backoff: ExponentialBackoff<SystemClock> = ExponentialBackoff {
        initial_interval: Duration::from_secs(2),
        max_interval: Duration::from_secs(30),
        max_elapsed_time: Some(Duration::from_secs(120)),
        ..Default::default()
    };

    let url = config.url();
    backoff::future::retry(backoff, || async {
        MySqlPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to connect to mysql, retrying...");
                backoff::Error::transient(e)
            })
    })
    .await
    .map_err(|e| anyhow::anyhow!("could not open mysql pool: {e}"))
}

pub struct MySqlTaskStore {
    pool: Pool<MySql>,
}

impl MySqlTaskStore {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for MySqlTaskStore {
    async fn ensure_task(
        &self,
        domain: &str,
        task_type: &TaskType,
        owner: &Owner,
    ) -> Result<Task> {
        let now = Utc::now();
        sqlx::query(
            "INSERT IGNORE INTO task (domain, task_type, owner, last_update, date) \
             VALUES (?, ?, ?, ?, NULL)",
        )
        .bind(domain)
        .bind(&task_type.0)
        .bind(&owner.0)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;

        let row = sqlx::query(
            "SELECT id, domain, task_type, owner, last_update, date FROM task \
             WHERE domain = ? AND task_type = ? AND owner = ?",
        )
        .bind(domain)
        .bind(&task_type.0)
        .bind(&owner.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;

        Ok(row_to_task(&row))
    }

    async fn pick_oldest(&self, domain: &str) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT id, domain, task_type, owner, last_update, date FROM task \
             WHERE domain = ? ORDER BY last_update ASC LIMIT 1",
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;

        Ok(row.map(|r| row_to_task(&r)))
    }

    async fn lease(&self, task_id: i64, observed_last_update: DateTime<Utc>) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE task SET last_update = ? WHERE id = ? AND last_update = ?",
        )
        .bind(now)
        .bind(task_id)
        .bind(observed_last_update)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete(&self, task_id: i64, date: NaiveDate) -> Result<()> {
        sqlx::query("UPDATE task SET date = ? WHERE id = ?")
            .bind(date)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }
}

fn row_to_task(row: &sqlx::mysql::MySqlRow) -> Task {
    Task {
        id: row.get::<i64, _>("id"),
        domain: row.get::<String, _>("domain"),
        task_type: TaskType(row.get::<String, _>("task_type")),
        owner: Owner(row.get::<String, _>("owner")),
        last_update: row.get::<DateTime<Utc>, _>("last_update"),
        date: row.get::<Option<NaiveDate>, _>("date"),
    }
}

pub struct MySqlStageRecordStore {
    pool: Pool<MySql>,
    table: String,
}

impl MySqlStageRecordStore {
    /// `table` is the domain's own stage-record table name (e.g.
    /// `jpost_stage_record`), since each domain owns a physically separate
    /// progress table.
    pub fn new(pool: Pool<MySql>, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

#[async_trait]
impl StageRecordStore for MySqlStageRecordStore {
    async fn get(&self, owner: &Owner, date: NaiveDate) -> Result<Option<StageRecord>> {
        let query = format!(
            "SELECT id, owner, date, state, created_time, last_updated FROM {} \
             WHERE owner = ? AND date = ?",
            self.table
        );
        let row = sqlx::query(&query)
            .bind(&owner.0)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        row.map(row_to_record).transpose()
    }

    async fn create(&self, owner: &Owner, date: NaiveDate) -> Result<StageRecord> {
        let now = Utc::now();
        let insert = format!(
            "INSERT IGNORE INTO {} (owner, date, state, created_time, last_updated) \
             VALUES (?, ?, 'CREATED', ?, ?)",
            self.table
        );
        sqlx::query(&insert)
            .bind(&owner.0)
            .bind(date)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        self.get(owner, date)
            .await?
            .ok_or_else(|| Error::Store("record vanished after insert".to_string()))
    }

    async fn cas_state(
        &self,
        id: i64,
        expected: StageState,
        new_state: StageState,
    ) -> Result<bool> {
        let now = Utc::now();
        let update = format!(
            "UPDATE {} SET state = ?, last_updated = ? WHERE id = ? AND state = ?",
            self.table
        );
        let result = sqlx::query(&update)
            .bind(new_state.as_str())
            .bind(now)
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}

fn row_to_record(row: sqlx::mysql::MySqlRow) -> Result<StageRecord> {
    let state: String = row.get("state");
    Ok(StageRecord {
        id: row.get::<i64, _>("id"),
        owner: row.get::<String, _>("owner"),
        date: row.get::<NaiveDate, _>("date"),
        state: state
            .parse()
            .map_err(|_| Error::Store(format!("unrecognized stage state: {state}")))?,
        created_time: row.get::<DateTime<Utc>, _>("created_time"),
        last_updated: row.get::<DateTime<Utc>, _>("last_updated"),
    })
}
