use std::sync::Arc;
use std::time::Duration;

use stagehand_core::DomainRunners;
use stagehand_lib::{StageRecordStore, Task, TaskStore};
use tokio::sync::{watch, Mutex};

const IDLE_POLL: Duration = Duration::from_secs(2);

/// Process-wide dispatch loop for one domain: a fixed pool of workers pulls
/// the oldest task, leases it, and runs its stage. Mirrors the shape of the
/// actor's worker-pool dispatch loop (spawn-per-unit-of-work, await the
/// `JoinHandle` to catch panics) but is pull-based: workers race to pick the
/// globally-oldest task instead of draining a push queue.
#[derive(Clone)]
pub struct Scheduler {
    domain: String,
    worker_count: usize,
    task_store: Arc<dyn TaskStore>,
    record_store: Arc<dyn StageRecordStore>,
    runners: Arc<DomainRunners>,
    /// Serializes the pick-oldest + lease pair across workers in this
    /// process. The CAS in `lease` is the real correctness guarantee; this
    /// mutex only avoids wasted re-picks under heavy local contention.
    picker: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(
        worker_count: usize,
        task_store: Arc<dyn TaskStore>,
        record_store: Arc<dyn StageRecordStore>,
        runners: Arc<DomainRunners>,
    ) -> Self {
        Self {
            domain: runners.domain().to_string(),
            worker_count,
            task_store,
            record_store,
            runners,
            picker: Arc::new(Mutex::new(())),
        }
    }

    /// Run `health_check` once, then start the worker pool. Returns once
    /// every worker has observed a shutdown signal and finished its current
    /// run, if any.
    pub async fn run_until_shutdown(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        self.runners.health_check(self.task_store.as_ref()).await?;

        let mut handles = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            let scheduler = self.clone();
            let shutdown_rx = shutdown.clone();
            handles.push(tokio::spawn(
                async move { scheduler.worker_loop(worker_id, shutdown_rx).await },
            ));
        }

        let _ = shutdown.changed().await;
        for handle in handles {
            if let Err(join_err) = handle.await {
                if join_err.is_panic() {
                    tracing::error!(error = %join_err, "scheduler worker panicked");
                }
            }
        }
        Ok(())
    }

    async fn worker_loop(&self, worker_id: usize, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                tracing::info!(worker_id, "worker exiting on shutdown signal");
                return;
            }

            match self.try_pick_and_lease().await {
                Some(task) => self.run_task(worker_id, task).await,
                None => {
                    tokio::select! {
                        _ = tokio::time::sleep(IDLE_POLL) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }
    }

    /// Pick the oldest task for this domain and attempt to lease it. Loses
    /// the race silently and returns `None` if nothing is pickable or
    /// another worker (in this process or another) wins the CAS first.
    async fn try_pick_and_lease(&self) -> Option<Task> {
        let _guard = self.picker.lock().await;

        let task = match self.task_store.pick_oldest(&self.domain).await {
            Ok(Some(task)) => task,
            Ok(None) => return None,
            Err(err) => {
                tracing::error!(error = %err, domain = %self.domain, "failed to pick oldest task");
                return None;
            }
        };

        match self.task_store.lease(task.id, task.last_update).await {
            Ok(true) => Some(task),
            Ok(false) => None,
            Err(err) => {
                tracing::error!(error = %err, task_id = task.id, "failed to lease task");
                None
            }
        }
    }

    async fn run_task(&self, worker_id: usize, task: Task) {
        let stage = match self.runners.lookup_or_unknown(&task.task_type, &task.owner) {
            Ok(stage) => stage,
            Err(err) => {
                tracing::error!(
                    worker_id,
                    error = %err,
                    "leased a task with no registered stage; leaving it for operator attention"
                );
                return;
            }
        };

        let task_store = self.task_store.clone();
        let record_store = self.record_store.clone();
        let join = tokio::spawn(async move {
            stagehand_core::run(stage.as_ref(), &task, task_store.as_ref(), record_store).await
        });

        match join.await {
            Ok(status) => {
                tracing::debug!(worker_id, status = %status, "worker completed a run");
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    // The lease already advanced last_update, so this task
                    // will not be re-picked until other tasks age past it --
                    // that natural back-off is the crash-recovery mechanism.
                    tracing::error!(worker_id, error = %join_err, "stage run panicked");
                }
            }
        }
    }
}
