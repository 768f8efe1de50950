use std::sync::Arc;

use stagehand_lib::{Error, Owner, Result, Stage, TaskStore, TaskType};

/// A domain's declarative task roster: which stages run once per owner
/// partition, and which run once globally under the `"jp"` sentinel owner.
///
/// This is the Rust equivalent of a Python scheduler subclass's
/// `TASK_OWNER_RUNNERS` / `TASK_GLOBAL_RUNNERS` class attributes: built once
/// at process startup and handed to the scheduler.
pub struct DomainRunners {
    domain: String,
    owners: Vec<Owner>,
    owner_runners: Vec<Arc<dyn Stage>>,
    global_runners: Vec<Arc<dyn Stage>>,
}

impl DomainRunners {
    pub fn new(domain: impl Into<String>, owners: Vec<Owner>) -> Self {
        Self {
            domain: domain.into(),
            owners,
            owner_runners: Vec::new(),
            global_runners: Vec::new(),
        }
    }

    pub fn with_owner_runner(mut self, stage: Arc<dyn Stage>) -> Self {
        self.owner_runners.push(stage);
        self
    }

    pub fn with_global_runner(mut self, stage: Arc<dyn Stage>) -> Self {
        self.global_runners.push(stage);
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    /// Find the stage that handles `task_type`, regardless of whether it is
    /// owner-scoped or global.
    pub fn stage_for(&self, task_type: &TaskType) -> Option<Arc<dyn Stage>> {
        self.owner_runners
            .iter()
            .chain(self.global_runners.iter())
            .find(|stage| &stage.task_type() == task_type)
            .cloned()
    }

    /// Ensure every declared `(task_type, owner)` pair has a task row.
    /// Idempotent: re-running after tasks already exist inserts nothing new.
    pub async fn health_check(&self, task_store: &dyn TaskStore) -> Result<()> {
        for owner in &self.owners {
            for stage in &self.owner_runners {
                task_store
                    .ensure_task(&self.domain, &stage.task_type(), owner)
                    .await?;
            }
        }
        for stage in &self.global_runners {
            task_store
                .ensure_task(&self.domain, &stage.task_type(), &Owner::global())
                .await?;
        }
        tracing::info!(
            domain = %self.domain,
            owners = self.owners.len(),
            owner_stages = self.owner_runners.len(),
            global_stages = self.global_runners.len(),
            "health check complete"
        );
        Ok(())
    }

    pub fn lookup_or_unknown(&self, task_type: &TaskType, owner: &Owner) -> Result<Arc<dyn Stage>> {
        self.stage_for(task_type).ok_or_else(|| Error::UnknownTask {
            domain: self.domain.clone(),
            task_type: task_type.0.clone(),
            owner: owner.0.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stagehand_lib::{StageContext, StageStatus};

    struct StubStage(TaskType);

    #[async_trait]
    impl Stage for StubStage {
        fn task_type(&self) -> TaskType {
            self.0.clone()
        }

        async fn start(&self, _ctx: &StageContext) -> anyhow::Result<StageStatus> {
            Ok(StageStatus::Success)
        }
    }

    struct NullTaskStore;

    #[async_trait::async_trait]
    impl TaskStore for NullTaskStore {
        async fn ensure_task(
            &self,
            _domain: &str,
            _task_type: &TaskType,
            _owner: &Owner,
        ) -> Result<stagehand_lib::Task> {
            Ok(stagehand_lib::Task {
                id: 1,
                domain: "d".into(),
                task_type: TaskType::from("T"),
                owner: Owner::from("o"),
                last_update: chrono::Utc::now(),
                date: None,
            })
        }

        async fn pick_oldest(&self, _domain: &str) -> Result<Option<stagehand_lib::Task>> {
            Ok(None)
        }

        async fn lease(
            &self,
            _task_id: i64,
            _observed_last_update: chrono::DateTime<chrono::Utc>,
        ) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, _task_id: i64, _date: chrono::NaiveDate) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn health_check_registers_owner_and_global_stages() {
        let runners = DomainRunners::new(
            "jpost",
            vec![Owner::from("tokyo"), Owner::from("osaka")],
        )
        .with_owner_runner(Arc::new(StubStage(TaskType::from("INGEST_BASIC"))))
        .with_global_runner(Arc::new(StubStage(TaskType::from("MIGRATE"))));

        runners.health_check(&NullTaskStore).await.unwrap();

        assert!(runners
            .stage_for(&TaskType::from("INGEST_BASIC"))
            .is_some());
        assert!(runners.stage_for(&TaskType::from("MIGRATE")).is_some());
        assert!(runners.stage_for(&TaskType::from("UNKNOWN")).is_none());
    }
}
