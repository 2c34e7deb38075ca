use indexmap::IndexMap;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Field label → human-readable messages, in the order the checks ran
pub type FieldErrors = IndexMap<String, Vec<String>>;

/// One entry of an ingestion error log.
///
/// Serialises as `{"node": {"row": 4, "errors": {...}}}` or
/// `{"graph": {"errors": [...]}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntry {
    /// A spreadsheet row that failed validation; `row` is the sheet row number
    Node { row: usize, errors: FieldErrors },
    /// A problem with the spreadsheet as a whole
    Graph { errors: Vec<String> },
}

/// Error log entity: the validation log written by one ingestion run
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "error_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub visualization_id: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub entries: Json,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
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
    pub fn log_entries(&self) -> Result<Vec<LogEntry>, serde_json::Error> {
        serde_json::from_value(self.entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_entry_wire_format() {
        let mut errors = FieldErrors::new();
        errors.insert("name".to_string(), vec!["This field is required.".to_string()]);
        errors.insert(
            "Categories".to_string(),
            vec!["This field is required.".to_string()],
        );
        let entry = LogEntry::Node { row: 4, errors };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"node": {"row": 4, "errors": {
                "name": ["This field is required."],
                "Categories": ["This field is required."]
            }}})
        );
        // key order survives serialisation
        let text = serde_json::to_string(&entry).unwrap();
        assert!(text.find("\"name\"").unwrap() < text.find("\"Categories\"").unwrap());
    }

    #[test]
    fn test_graph_entry_wire_format() {
        let entry = LogEntry::Graph {
            errors: vec!["no categories".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"graph": {"errors": ["no categories"]}})
        );
    }
}
