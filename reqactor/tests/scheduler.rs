use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stagehand_core::DomainRunners;
use stagehand_lib::{Owner, Stage, StageContext, StageStatus, TaskType};
use stagehand_runtime::Scheduler;
use stagehand_tasks::{InMemoryStageRecordStore, InMemoryTaskStore};
use tokio::sync::watch;

struct CountingStage {
    task_type: TaskType,
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Stage for CountingStage {
    fn task_type(&self) -> TaskType {
        self.task_type.clone()
    }

    async fn start(&self, _ctx: &StageContext) -> anyhow::Result<StageStatus> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(StageStatus::Success)
    }
}

#[tokio::test]
async fn scheduler_runs_every_declared_task_at_least_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let owners = vec![Owner::from("tokyo"), Owner::from("osaka"), Owner::from("kyoto")];
    let runners = Arc::new(
        DomainRunners::new("jpost", owners).with_owner_runner(Arc::new(CountingStage {
            task_type: TaskType::from("INGEST_BASIC"),
            runs: runs.clone(),
        })),
    );

    let task_store: Arc<dyn stagehand_lib::TaskStore> = Arc::new(InMemoryTaskStore::new());
    let record_store: Arc<dyn stagehand_lib::StageRecordStore> =
        Arc::new(InMemoryStageRecordStore::new());
    let scheduler = Scheduler::new(2, task_store, record_store, runners);

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { scheduler.run_until_shutdown(rx).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 3, "every owner's task should have run once");
}
