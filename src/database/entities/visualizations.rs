use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Visualization entity: one imported spreadsheet and its display settings
///
/// Related entities:
/// - `nodes`: categories and data points imported from the spreadsheet
/// - `error_logs`: validation log of the latest ingestion run
/// - `styles`: aggregated stylesheet of the latest ingestion run
///
/// `updated_at` is the modification time used to decide whether an error log
/// is stale; `last_synced_at` only moves when an ingestion run found categories.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "visualizations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub user_id: String,
    pub spreadsheet_id: String,
    pub is_public: bool,
    pub last_synced_at: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::nodes::Entity")]
    Nodes,
    #[sea_orm(has_many = "super::error_logs::Entity")]
    ErrorLogs,
    #[sea_orm(has_many = "super::styles::Entity")]
    Styles,
}

impl Related<super::nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nodes.def()
    }
}

impl Related<super::error_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ErrorLogs.def()
    }
}

impl Related<super::styles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Styles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::NotSet,
            user_id: ActiveValue::NotSet,
            spreadsheet_id: ActiveValue::NotSet,
            is_public: Set(false),
            last_synced_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    pub fn set_updated_at(mut self) -> Self {
        self.updated_at = Set(chrono::Utc::now());
        self
    }
}

impl Model {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Readable by its owner, or by anyone when public
    pub fn is_readable_by(&self, user_id: Option<&str>) -> bool {
        self.is_public || user_id.is_some_and(|user| self.is_owned_by(user))
    }
}
