use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Style entity: the stylesheet aggregated by one ingestion run
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "styles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub visualization_id: i32,
    #[sea_orm(column_type = "Text")]
    pub styles: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::visualizations::Entity",
        from = "Column::VisualizationId",
        to = "super::visualizations::Column::Id"
    )]
    Visualizations,
}

impl Related<super::visualizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Visualizations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
