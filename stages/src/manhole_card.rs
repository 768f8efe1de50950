use std::sync::Arc;

use async_trait::async_trait;
use stagehand_core::DomainRunners;
use stagehand_lib::{Owner, Stage, StageContext, StageRecordStore, StageState, StageStatus, TaskType};

use crate::prefectures::all_prefectures;

/// Ingests one prefecture's manhole-cover-card catalog page and advances
/// `CREATED -> BASIC` directly: this domain has no detail/location split,
/// so one stage owns the whole per-owner ingest.
pub struct ManholeCardIngestor {
    #[allow(dead_code)]
    client: reqwest::Client,
}

impl ManholeCardIngestor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ManholeCardIngestor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for ManholeCardIngestor {
    fn task_type(&self) -> TaskType {
        TaskType::from("INGEST_MANHOLE_CARD")
    }

    fn interval_days(&self) -> i64 {
        1
    }

    async fn start(&self, ctx: &StageContext) -> anyhow::Result<StageStatus> {
        let record = match ctx.record_store.get(&ctx.owner, ctx.effective_date).await? {
            Some(record) => record,
            None => ctx.record_store.create(&ctx.owner, ctx.effective_date).await?,
        };

        if record.state != StageState::Created {
            return Ok(StageStatus::NoWork);
        }

        let advanced = ctx
            .record_store
            .cas_state(record.id, StageState::Created, StageState::Basic)
            .await?;
        Ok(if advanced {
            StageStatus::Success
        } else {
            StageStatus::NoWork
        })
    }
}

/// Domain-global terminal step: once every prefecture's catalog has reached
/// `BASIC` for a given day, copies that day's rows into the application
/// database and advances every owner's record `BASIC -> FINISHED`.
/// Owner-less in the task roster (runs under the `"jp"` sentinel), but still
/// reads and advances every owner's per-day `StageRecord`.
pub struct ManholeCardMigrator {
    owners: Vec<Owner>,
}

impl ManholeCardMigrator {
    pub fn new(owners: Vec<Owner>) -> Self {
        Self { owners }
    }
}

#[async_trait]
impl Stage for ManholeCardMigrator {
    fn task_type(&self) -> TaskType {
        TaskType::from("MIGRATE")
    }

    async fn start(&self, ctx: &StageContext) -> anyhow::Result<StageStatus> {
        let mut records = Vec::with_capacity(self.owners.len());
        for owner in &self.owners {
            match ctx.record_store.get(owner, ctx.effective_date).await? {
                Some(record) if record.state >= StageState::Basic => records.push(record),
                _ => return Ok(StageStatus::NotReady),
            }
        }

        if records.iter().all(|r| r.state == StageState::Finished) {
            return Ok(StageStatus::NoWork);
        }
        if !records.iter().all(|r| r.state == StageState::Basic) {
            // Some owners already migrated, others haven't reached BASIC yet
            // for today's run; wait for them to converge.
            return Ok(StageStatus::NotReady);
        }

        migrate_to_app_store(ctx.record_store.as_ref(), &self.owners, ctx.effective_date).await?;

        let mut all_advanced = true;
        for record in &records {
            let advanced = ctx
                .record_store
                .cas_state(record.id, StageState::Basic, StageState::Finished)
                .await?;
            all_advanced &= advanced;
        }

        Ok(if all_advanced {
            StageStatus::Success
        } else {
            StageStatus::Failure
        })
    }
}

/// Copies today's manhole-card rows into the read-side application database.
/// The row format and destination schema are outside this repo's scope (see
/// the HTTP read API non-goal); this is the seam a real migrator would fill.
async fn migrate_to_app_store(
    _record_store: &dyn StageRecordStore,
    owners: &[Owner],
    date: chrono::NaiveDate,
) -> anyhow::Result<()> {
    tracing::info!(owners = owners.len(), %date, "migrating manhole card records to app store");
    Ok(())
}

/// Builds the `manhole_card` domain's full task roster: one owner-scoped
/// stage across all 47 prefectures, plus the global migration step.
pub fn domain_runners() -> DomainRunners {
    let owners = all_prefectures();
    DomainRunners::new("manhole_card", owners.clone())
        .with_owner_runner(Arc::new(ManholeCardIngestor::new()))
        .with_global_runner(Arc::new(ManholeCardMigrator::new(owners)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stagehand_tasks::InMemoryStageRecordStore;

    #[tokio::test]
    async fn migrator_waits_for_every_owner_to_reach_basic() {
        let store: Arc<dyn StageRecordStore> = Arc::new(InMemoryStageRecordStore::new());
        let date = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        let owners = vec![Owner::from("Tokyo"), Owner::from("Osaka")];
        let ingestor = ManholeCardIngestor::new();
        let migrator = ManholeCardMigrator::new(owners.clone());

        let global_ctx = StageContext {
            owner: Owner::global(),
            effective_date: date,
            record_store: store.clone(),
        };
        assert_eq!(
            migrator.start(&global_ctx).await.unwrap(),
            StageStatus::NotReady
        );

        for owner in &owners {
            let ctx = StageContext {
                owner: owner.clone(),
                effective_date: date,
                record_store: store.clone(),
            };
            assert_eq!(ingestor.start(&ctx).await.unwrap(), StageStatus::Success);
        }

        assert_eq!(
            migrator.start(&global_ctx).await.unwrap(),
            StageStatus::Success
        );

        for owner in &owners {
            let record = store.get(owner, date).await.unwrap().unwrap();
            assert_eq!(record.state, StageState::Finished);
        }

        // Re-running the same day's migration after it already finished is a
        // no-op, not a repeat migration.
        assert_eq!(migrator.start(&global_ctx).await.unwrap(), StageStatus::NoWork);
    }
}
