//! Spreadsheet ingestion: the destructive replace of a visualization's dataset.
//!
//! A run moves through `Fetching → Validating → Committing → Done`. Everything
//! that can fail for reasons outside the database (credentials, the spreadsheet
//! source, timeouts) happens while fetching, before the transaction opens, so a
//! fatal error never leaves a trace. The delete and the re-create then share a
//! single transaction: readers see either the previous dataset or the new one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::config::IngestionConfig;
use crate::database::entities::{error_logs, nodes, styles, visualizations, LogEntry};
use crate::errors::{AuthError, IngestionError, IngestionResult};
use crate::services::category_resolver::{resolve_categories, CategoryIndex};
use crate::services::style_aggregator::aggregate_styles;
use crate::services::validation::{
    list_categories, parse_importance, validate_node, ImportanceRange,
};
use crate::sources::{
    CategoryRow, Credential, CredentialProvider, NodeRow, SimpleCss, SpreadsheetSource,
};

/// Sheet row number of the first data row: rows are 1-based and row 1 is the header
const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStage {
    Fetching,
    Validating,
    Committing,
    Done,
    Failed,
}

impl IngestionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStage::Fetching => "fetching",
            IngestionStage::Validating => "validating",
            IngestionStage::Committing => "committing",
            IngestionStage::Done => "done",
            IngestionStage::Failed => "failed",
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub visualization_id: i32,
    pub categories: usize,
    pub nodes: usize,
    pub rejected_rows: usize,
    pub entries: Vec<LogEntry>,
}

impl IngestionReport {
    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Everything read from the spreadsheet for one run
#[derive(Debug, Clone, Default)]
pub struct FetchedSpreadsheet {
    pub categories: Vec<CategoryRow>,
    pub nodes: Vec<NodeRow>,
    pub simple_css: SimpleCss,
    pub generic_css: String,
}

/// Marks a visualization as being ingested for as long as it lives
struct RunGuard {
    running: Arc<DashSet<i32>>,
    visualization_id: i32,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.remove(&self.visualization_id);
    }
}

#[derive(Clone)]
pub struct IngestionService {
    db: DatabaseConnection,
    credentials: Arc<dyn CredentialProvider>,
    source: Arc<dyn SpreadsheetSource>,
    config: IngestionConfig,
    running: Arc<DashSet<i32>>,
}

impl IngestionService {
    pub fn new(
        db: DatabaseConnection,
        credentials: Arc<dyn CredentialProvider>,
        source: Arc<dyn SpreadsheetSource>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            db,
            credentials,
            source,
            config,
            running: Arc::new(DashSet::new()),
        }
    }

    pub fn is_running(&self, visualization_id: i32) -> bool {
        self.running.contains(&visualization_id)
    }

    /// Replace the visualization's nodes, style and error log with freshly
    /// validated spreadsheet data.
    #[instrument(skip(self, visualization), fields(visualization_id = visualization.id))]
    pub async fn run_ingestion(
        &self,
        visualization: &visualizations::Model,
    ) -> IngestionResult<IngestionReport> {
        ensure_ingestible(visualization)?;
        let _guard = self.acquire(visualization.id)?;

        info!(
            "Ingestion {}: spreadsheet {} for user {}",
            IngestionStage::Fetching.as_str(),
            visualization.spreadsheet_id,
            visualization.user_id
        );
        let fetched = match self.fetch(visualization).await {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!("Ingestion {}: {}", IngestionStage::Failed.as_str(), err);
                return Err(err);
            }
        };

        match self.replace(visualization, fetched).await {
            Ok(report) => {
                info!(
                    "Ingestion {}: {} categories, {} nodes, {} rejected rows",
                    IngestionStage::Done.as_str(),
                    report.categories,
                    report.nodes,
                    report.rejected_rows
                );
                Ok(report)
            }
            Err(err) => {
                warn!(
                    "Ingestion {}: transaction rolled back: {}",
                    IngestionStage::Failed.as_str(),
                    err
                );
                Err(err)
            }
        }
    }

    fn acquire(&self, visualization_id: i32) -> IngestionResult<RunGuard> {
        if !self.running.insert(visualization_id) {
            return Err(IngestionError::AlreadyRunning(visualization_id));
        }
        Ok(RunGuard {
            running: self.running.clone(),
            visualization_id,
        })
    }

    async fn fetch(
        &self,
        visualization: &visualizations::Model,
    ) -> IngestionResult<FetchedSpreadsheet> {
        let credential = self.credential_for(&visualization.user_id).await?;
        self.fetch_spreadsheet(&credential, &visualization.spreadsheet_id)
            .await
    }

    async fn credential_for(&self, user_id: &str) -> IngestionResult<Credential> {
        let lookup = async {
            let credential = self
                .credentials
                .get_credential(user_id)
                .await?
                .ok_or_else(|| AuthError::CredentialNotFound(user_id.to_string()))?;
            if credential.is_expired() {
                debug!("Refreshing expired credential for user {}", user_id);
                return self.credentials.refresh(user_id, credential).await;
            }
            Ok::<Credential, AuthError>(credential)
        };

        let credential = tokio::time::timeout(self.config.fetch_timeout(), lookup)
            .await
            .map_err(|_| IngestionError::Timeout {
                stage: "obtaining credentials",
                seconds: self.config.fetch_timeout_secs,
            })??;
        Ok(credential)
    }

    async fn fetch_spreadsheet(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> IngestionResult<FetchedSpreadsheet> {
        let reads = async {
            tokio::try_join!(
                self.source.get_categories(credential, spreadsheet_id),
                self.source.get_nodes(credential, spreadsheet_id),
                self.source.get_simple_css(credential, spreadsheet_id),
                self.source.get_generic_css(credential, spreadsheet_id),
            )
        };

        let (categories, nodes, simple_css, generic_css) =
            tokio::time::timeout(self.config.fetch_timeout(), reads)
                .await
                .map_err(|_| IngestionError::Timeout {
                    stage: "fetching worksheets",
                    seconds: self.config.fetch_timeout_secs,
                })??;

        debug!(
            "Fetched {} category rows, {} node rows, {} style classes",
            categories.len(),
            nodes.len(),
            simple_css.len()
        );
        Ok(FetchedSpreadsheet {
            categories,
            nodes,
            simple_css,
            generic_css,
        })
    }

    /// Runs the delete-and-recreate inside one transaction. Returning early
    /// drops the transaction, which rolls it back.
    async fn replace(
        &self,
        visualization: &visualizations::Model,
        fetched: FetchedSpreadsheet,
    ) -> IngestionResult<IngestionReport> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        // A delete that landed while fetching has already queued its cleanup
        if visualizations::Entity::find_by_id(visualization.id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(IngestionError::VisualizationGone(visualization.id));
        }

        delete_owned_entities(&txn, visualization.id).await?;

        let categories =
            resolve_categories(&txn, visualization.id, &fetched.categories, now).await?;

        let mut entries = Vec::new();
        let mut created = 0;
        let mut rejected = 0;

        if categories.is_empty() {
            entries.push(LogEntry::Graph {
                errors: vec![self.missing_categories_message()],
            });
        } else {
            debug!("Ingestion {}", IngestionStage::Validating.as_str());
            let range = ImportanceRange {
                min: self.config.min_importance,
                max: self.config.max_importance,
            };

            for (index, row) in fetched.nodes.iter().enumerate() {
                let errors = validate_node(row, &categories, range);
                if errors.is_empty() {
                    insert_node(&txn, visualization.id, row, &categories, now).await?;
                    created += 1;
                } else {
                    entries.push(LogEntry::Node {
                        row: index + FIRST_DATA_ROW,
                        errors,
                    });
                    rejected += 1;
                }
            }

            styles::ActiveModel {
                visualization_id: Set(visualization.id),
                styles: Set(aggregate_styles(&fetched.simple_css, &fetched.generic_css)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            visualizations::ActiveModel {
                id: Set(visualization.id),
                updated_at: Set(now),
                last_synced_at: Set(Some(now)),
                ..Default::default()
            }
            .update(&txn)
            .await?;
        }

        debug!("Ingestion {}", IngestionStage::Committing.as_str());
        if !entries.is_empty() {
            error_logs::ActiveModel {
                visualization_id: Set(visualization.id),
                entries: Set(serde_json::to_value(&entries)?),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        Ok(IngestionReport {
            visualization_id: visualization.id,
            categories: categories.len(),
            nodes: created,
            rejected_rows: rejected,
            entries,
        })
    }

    fn missing_categories_message(&self) -> String {
        format!(
            "The spreadsheet selected must contain 2 worksheets named '{0}' and '{1}'. \
             '{0}' must contain at least one category.",
            self.config.categories_worksheet, self.config.nodes_worksheet
        )
    }
}

fn ensure_ingestible(visualization: &visualizations::Model) -> IngestionResult<()> {
    let missing = if visualization.user_id.trim().is_empty() {
        Some("missing owner")
    } else if visualization.spreadsheet_id.trim().is_empty() {
        Some("missing spreadsheet id")
    } else {
        None
    };
    match missing {
        Some(reason) => Err(IngestionError::NotIngestible {
            id: visualization.id,
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Remove every node, error log and style owned by a visualization
pub async fn delete_owned_entities<C>(conn: &C, visualization_id: i32) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let removed_nodes = nodes::Entity::delete_many()
        .filter(nodes::Column::VisualizationId.eq(visualization_id))
        .exec(conn)
        .await?;
    let removed_logs = error_logs::Entity::delete_many()
        .filter(error_logs::Column::VisualizationId.eq(visualization_id))
        .exec(conn)
        .await?;
    let removed_styles = styles::Entity::delete_many()
        .filter(styles::Column::VisualizationId.eq(visualization_id))
        .exec(conn)
        .await?;

    debug!(
        "Removed {} nodes, {} error logs, {} styles of visualization {}",
        removed_nodes.rows_affected,
        removed_logs.rows_affected,
        removed_styles.rows_affected,
        visualization_id
    );
    Ok(())
}

async fn insert_node<C>(
    conn: &C,
    visualization_id: i32,
    row: &NodeRow,
    categories: &CategoryIndex,
    created_at: DateTime<Utc>,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let category_ids: Vec<i32> = list_categories(row)
        .iter()
        .filter_map(|name| categories.id_of(name))
        .collect();
    let importance = parse_importance(row.importance.as_deref())
        .and_then(|value| i32::try_from(value).ok());

    nodes::ActiveModel {
        visualization_id: Set(visualization_id),
        is_category: Set(false),
        name: Set(row.name.clone().unwrap_or_default()),
        short_description: Set(row.short_description.clone()),
        long_description: Set(row.long_description.clone()),
        context_url: Set(row.context_url.clone()),
        credit: Set(row.credit.clone()),
        importance: Set(importance),
        category_ids: Set(json!(category_ids)),
        node_style: Set(row.node_style.clone()),
        label_style: Set(row.label_style.clone()),
        created_at: Set(created_at),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}
