use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::CleanupConfig;
use crate::database::entities::cleanup_tasks;
use crate::services::ingestion_service::delete_owned_entities;

/// Result of one cleanup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub completed: usize,
    pub failed: usize,
}

/// Removes entities owned by deleted visualizations.
///
/// Tasks are processed at least once: a task row is only deleted in the same
/// transaction that removes the owned rows, and a failed attempt is recorded
/// on the task so the next pass retries it.
#[derive(Clone)]
pub struct CleanupService {
    db: DatabaseConnection,
    config: CleanupConfig,
}

impl CleanupService {
    pub fn new(db: DatabaseConnection, config: CleanupConfig) -> Self {
        Self { db, config }
    }

    pub async fn pending_tasks(&self) -> Result<Vec<cleanup_tasks::Model>, DbErr> {
        cleanup_tasks::Entity::find()
            .filter(cleanup_tasks::Column::Attempts.lt(self.config.max_attempts))
            .order_by_asc(cleanup_tasks::Column::CreatedAt)
            .order_by_asc(cleanup_tasks::Column::Id)
            .all(&self.db)
            .await
    }

    pub async fn run_pending(&self) -> Result<CleanupSummary, DbErr> {
        let mut summary = CleanupSummary::default();

        for task in self.pending_tasks().await? {
            match self.process(&task).await {
                Ok(()) => {
                    debug!(
                        "Cleaned up visualization {} (task {})",
                        task.visualization_id, task.id
                    );
                    summary.completed += 1;
                }
                Err(err) => {
                    warn!(
                        "Cleanup of visualization {} failed on attempt {}: {}",
                        task.visualization_id,
                        task.attempts + 1,
                        err
                    );
                    self.record_failure(&task, &err).await?;
                    summary.failed += 1;
                }
            }
        }

        if summary.completed > 0 || summary.failed > 0 {
            info!(
                "Cleanup pass finished: {} completed, {} failed",
                summary.completed, summary.failed
            );
        }
        Ok(summary)
    }

    async fn process(&self, task: &cleanup_tasks::Model) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;
        delete_owned_entities(&txn, task.visualization_id).await?;
        cleanup_tasks::Entity::delete_by_id(task.id).exec(&txn).await?;
        txn.commit().await
    }

    async fn record_failure(&self, task: &cleanup_tasks::Model, err: &DbErr) -> Result<(), DbErr> {
        cleanup_tasks::ActiveModel {
            id: Set(task.id),
            attempts: Set(task.attempts + 1),
            last_error: Set(Some(err.to_string())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    /// Run a pass every `interval` and whenever `notify` fires.
    pub fn spawn_worker(self, interval: Duration, notify: Arc<Notify>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = notify.notified() => {}
                }

                if let Err(err) = self.run_pending().await {
                    error!("Cleanup pass failed: {}", err);
                }
            }
        })
    }
}
