use std::sync::Arc;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info};
use url::Url;

use crate::database::entities::{cleanup_tasks, error_logs, nodes, styles, visualizations, LogEntry};
use crate::errors::{AuthError, VisualizationError, VisualizationResult};

pub const MAX_NAME_LENGTH: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVisualization {
    pub user_id: String,
    pub name: String,
    pub spreadsheet_link: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizationUpdate {
    pub name: Option<String>,
    pub spreadsheet_link: Option<String>,
    pub is_public: Option<bool>,
}

/// Resolve a spreadsheet link to its id.
///
/// Accepts `...?key=<id>` links, where a `#gid=` fragment is ignored, and
/// `/spreadsheets/d/<id>/...` paths.
pub fn parse_spreadsheet_link(link: &str) -> VisualizationResult<String> {
    let invalid = || VisualizationError::InvalidSpreadsheetLink(link.to_string());
    let url = Url::parse(link.trim()).map_err(|_| invalid())?;

    if let Some((_, key)) = url.query_pairs().find(|(name, _)| name == "key") {
        return Some(key.into_owned())
            .filter(|key| !key.is_empty())
            .ok_or_else(invalid);
    }

    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    segments
        .windows(3)
        .find(|window| window[0] == "spreadsheets" && window[1] == "d" && !window[2].is_empty())
        .map(|window| window[2].to_string())
        .ok_or_else(invalid)
}

fn validate_name(name: &str) -> VisualizationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(VisualizationError::Validation(
            "Visualization name is required".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(VisualizationError::Validation(format!(
            "Visualization name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

/// Ownership check for mutations and error logs
pub fn ensure_owner(
    visualization: &visualizations::Model,
    user_id: Option<&str>,
) -> VisualizationResult<()> {
    let user_id = user_id.ok_or(AuthError::AuthenticationRequired)?;
    if !visualization.is_owned_by(user_id) {
        return Err(AuthError::PermissionDenied(format!(
            "visualization {} belongs to another user",
            visualization.id
        ))
        .into());
    }
    Ok(())
}

pub fn ensure_readable(
    visualization: &visualizations::Model,
    user_id: Option<&str>,
) -> VisualizationResult<()> {
    if visualization.is_readable_by(user_id) {
        return Ok(());
    }
    match user_id {
        None => Err(AuthError::AuthenticationRequired.into()),
        Some(_) => Err(AuthError::PermissionDenied(format!(
            "visualization {} is private",
            visualization.id
        ))
        .into()),
    }
}

#[derive(Clone)]
pub struct VisualizationService {
    db: DatabaseConnection,
    cleanup_notify: Option<Arc<Notify>>,
}

impl VisualizationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cleanup_notify: None,
        }
    }

    /// Wake this notifier after every deletion so the cleanup worker runs promptly
    pub fn with_cleanup_notify(mut self, notify: Arc<Notify>) -> Self {
        self.cleanup_notify = Some(notify);
        self
    }

    pub async fn create(
        &self,
        input: NewVisualization,
    ) -> VisualizationResult<visualizations::Model> {
        if input.user_id.trim().is_empty() {
            return Err(AuthError::AuthenticationRequired.into());
        }
        let name = validate_name(&input.name)?;
        let spreadsheet_id = parse_spreadsheet_link(&input.spreadsheet_link)?;

        let mut active = visualizations::ActiveModel::new();
        active.name = Set(name);
        active.user_id = Set(input.user_id);
        active.spreadsheet_id = Set(spreadsheet_id);
        active.is_public = Set(input.is_public);

        let created = active.insert(&self.db).await?;
        info!(
            "Created visualization {} for user {}",
            created.id, created.user_id
        );
        Ok(created)
    }

    pub async fn get(&self, id: i32) -> VisualizationResult<visualizations::Model> {
        visualizations::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(VisualizationError::NotFound(id))
    }

    /// Visualizations owned by `user_id`, newest first
    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> VisualizationResult<Vec<visualizations::Model>> {
        Ok(visualizations::Entity::find()
            .filter(visualizations::Column::UserId.eq(user_id))
            .order_by_desc(visualizations::Column::CreatedAt)
            .order_by_desc(visualizations::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list_public(&self) -> VisualizationResult<Vec<visualizations::Model>> {
        Ok(visualizations::Entity::find()
            .filter(visualizations::Column::IsPublic.eq(true))
            .order_by_desc(visualizations::Column::CreatedAt)
            .order_by_desc(visualizations::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn update(
        &self,
        visualization: &visualizations::Model,
        update: VisualizationUpdate,
    ) -> VisualizationResult<visualizations::Model> {
        let mut active: visualizations::ActiveModel = visualization.clone().into();

        if let Some(name) = update.name {
            active.name = Set(validate_name(&name)?);
        }
        if let Some(link) = update.spreadsheet_link {
            active.spreadsheet_id = Set(parse_spreadsheet_link(&link)?);
        }
        if let Some(is_public) = update.is_public {
            active.is_public = Set(is_public);
        }

        let updated = active.set_updated_at().update(&self.db).await?;
        debug!("Updated visualization {}", updated.id);
        Ok(updated)
    }

    /// Delete the visualization row and queue removal of everything it owns.
    ///
    /// The row disappears from every listing as soon as this returns; the
    /// owned nodes, styles and error logs go on the next cleanup pass.
    pub async fn delete(&self, visualization: &visualizations::Model) -> VisualizationResult<()> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        visualizations::Entity::delete_by_id(visualization.id)
            .exec(&txn)
            .await?;

        cleanup_tasks::ActiveModel {
            visualization_id: Set(visualization.id),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(
            "Deleted visualization {}, cleanup queued",
            visualization.id
        );

        if let Some(notify) = &self.cleanup_notify {
            notify.notify_one();
        }
        Ok(())
    }

    /// Entries of the latest error log, or `None` when there is no log or the
    /// visualization was modified after the log was written.
    pub async fn current_error_log(
        &self,
        visualization: &visualizations::Model,
    ) -> VisualizationResult<Option<Vec<LogEntry>>> {
        let latest = error_logs::Entity::find()
            .filter(error_logs::Column::VisualizationId.eq(visualization.id))
            .order_by_desc(error_logs::Column::UpdatedAt)
            .order_by_desc(error_logs::Column::Id)
            .one(&self.db)
            .await?;

        match latest {
            Some(log) if log.updated_at >= visualization.updated_at => {
                Ok(Some(log.log_entries()?))
            }
            Some(log) => {
                debug!(
                    "Error log {} of visualization {} is stale",
                    log.id, visualization.id
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn current_style(
        &self,
        visualization: &visualizations::Model,
    ) -> VisualizationResult<Option<String>> {
        let style = styles::Entity::find()
            .filter(styles::Column::VisualizationId.eq(visualization.id))
            .order_by_desc(styles::Column::Id)
            .one(&self.db)
            .await?;
        Ok(style.map(|style| style.styles))
    }

    pub async fn get_node(
        &self,
        visualization: &visualizations::Model,
        node_id: i32,
    ) -> VisualizationResult<nodes::Model> {
        nodes::Entity::find_by_id(node_id)
            .filter(nodes::Column::VisualizationId.eq(visualization.id))
            .one(&self.db)
            .await?
            .ok_or(VisualizationError::NodeNotFound {
                visualization_id: visualization.id,
                node_id,
            })
    }
}
