use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pending removal of the nodes, styles and error logs of a deleted visualization
///
/// Written in the same transaction that deletes the visualization row and
/// removed by the cleanup worker once the owned rows are gone. A failed pass
/// bumps `attempts` so the task is retried on the next one.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cleanup_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub visualization_id: i32,
    pub attempts: i32,
    #[sea_orm(column_type = "Text")]
    pub last_error: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
