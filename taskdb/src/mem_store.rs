use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use stagehand_lib::{Error, Owner, Result, StageRecord, StageRecordStore, StageState, Task, TaskStore, TaskType};

/// In-memory `TaskStore`, used for tests and for local development without a
/// database. Not shared across processes; every `lease` is a plain
/// read-compare-write under a single mutex, which is a stronger guarantee
/// than the database's CAS but exercises the same interface.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<i64, Task>>,
    next_id: Mutex<i64>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn ensure_task(
        &self,
        domain: &str,
        task_type: &TaskType,
        owner: &Owner,
    ) -> Result<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(existing) = tasks
            .values()
            .find(|t| t.domain == domain && &t.task_type == task_type && &t.owner == owner)
        {
            return Ok(existing.clone());
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let task = Task {
            id: *next_id,
            domain: domain.to_string(),
            task_type: task_type.clone(),
            owner: owner.clone(),
            last_update: Utc::now(),
            date: None,
        };
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn pick_oldest(&self, domain: &str) -> Result<Option<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .values()
            .filter(|t| t.domain == domain)
            .min_by_key(|t| t.last_update)
            .cloned())
    }

    async fn lease(&self, task_id: i64, observed_last_update: DateTime<Utc>) -> Result<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(&task_id) {
            Some(task) if task.last_update == observed_last_update => {
                task.last_update = Utc::now();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(Error::Store(format!("no such task: {task_id}"))),
        }
    }

    async fn complete(&self, task_id: i64, date: NaiveDate) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .get_mut(&task_id)
            .ok_or_else(|| Error::Store(format!("no such task: {task_id}")))?;
        task.date = Some(date);
        Ok(())
    }
}

/// In-memory `StageRecordStore`, keyed by `(owner, date)`.
#[derive(Default)]
pub struct InMemoryStageRecordStore {
    records: Mutex<HashMap<(String, NaiveDate), StageRecord>>,
    next_id: Mutex<i64>,
}

impl InMemoryStageRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StageRecordStore for InMemoryStageRecordStore {
    async fn get(&self, owner: &Owner, date: NaiveDate) -> Result<Option<StageRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&(owner.0.clone(), date)).cloned())
    }

    async fn create(&self, owner: &Owner, date: NaiveDate) -> Result<StageRecord> {
        let mut records = self.records.lock().unwrap();
        let key = (owner.0.clone(), date);
        if let Some(existing) = records.get(&key) {
            return Ok(existing.clone());
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let now = Utc::now();
        let record = StageRecord {
            id: *next_id,
            owner: owner.0.clone(),
            date,
            state: StageState::Created,
            created_time: now,
            last_updated: now,
        };
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn cas_state(
        &self,
        id: i64,
        expected: StageState,
        new_state: StageState,
    ) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        match records.values_mut().find(|r| r.id == id) {
            Some(record) if record.state == expected => {
                record.state = new_state;
                record.last_updated = Utc::now();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(Error::Store(format!("no such stage record: {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_task_is_idempotent() {
        let store = InMemoryTaskStore::new();
        let domain = "jpost";
        let task_type = TaskType::from("INGEST_BASIC");
        let owner = Owner::from("tokyo");

        let a = store.ensure_task(domain, &task_type, &owner).await.unwrap();
        let b = store.ensure_task(domain, &task_type, &owner).await.unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn lease_fails_on_stale_observed_timestamp() {
        let store = InMemoryTaskStore::new();
        let task = store
            .ensure_task("jpost", &TaskType::from("INGEST_BASIC"), &Owner::from("tokyo"))
            .await
            .unwrap();

        let first = store.lease(task.id, task.last_update).await.unwrap();
        assert!(first);

        let second = store.lease(task.id, task.last_update).await.unwrap();
        assert!(!second, "second lease with the stale timestamp must fail");
    }

    #[tokio::test]
    async fn pick_oldest_returns_smallest_last_update() {
        let store = InMemoryTaskStore::new();
        let older = store
            .ensure_task("jpost", &TaskType::from("A"), &Owner::from("tokyo"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .ensure_task("jpost", &TaskType::from("B"), &Owner::from("tokyo"))
            .await
            .unwrap();

        let picked = store.pick_oldest("jpost").await.unwrap().unwrap();
        assert_eq!(picked.id, older.id);
    }

    #[tokio::test]
    async fn stage_record_transitions_are_cas_guarded() {
        let store = InMemoryStageRecordStore::new();
        let owner = Owner::from("tokyo");
        let date = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let record = store.create(&owner, date).await.unwrap();

        let ok = store
            .cas_state(record.id, StageState::Created, StageState::Basic)
            .await
            .unwrap();
        assert!(ok);

        let stale = store
            .cas_state(record.id, StageState::Created, StageState::Basic)
            .await
            .unwrap();
        assert!(!stale);
    }
}
