use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Node entity: one vertex of a visualization's graph
///
/// A node either is a category (`is_category`, name and styles only) or
/// belongs to one or more categories through `category_ids`, an ordered JSON
/// array of category node ids within the same visualization.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub visualization_id: i32,
    pub is_category: bool,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub short_description: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub long_description: Option<String>,
    pub context_url: Option<String>,
    pub credit: Option<String>,
    pub importance: Option<i32>,
    #[sea_orm(column_type = "JsonBinary")]
    pub category_ids: Json,
    pub node_style: Option<String>,
    pub label_style: Option<String>,
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

impl Model {
    /// Category references in the order they were listed in the spreadsheet
    pub fn category_ids(&self) -> Vec<i32> {
        serde_json::from_value(self.category_ids.clone()).unwrap_or_default()
    }
}
