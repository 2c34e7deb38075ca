use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use sea_orm::ActiveValue::Set;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use serde_json::json;
use tracing::{debug, warn};

use crate::database::entities::nodes;
use crate::sources::CategoryRow;

/// Category name → id of the category node created for it, in worksheet order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    ids: IndexMap<String, i32>,
}

impl CategoryIndex {
    /// Returns the id previously stored under `name`, if any
    pub fn insert(&mut self, name: String, id: i32) -> Option<i32> {
        self.ids.insert(name, id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }
}

/// Persist one category node per fetched row and index them by name.
///
/// Runs on the caller's connection so it joins the ingestion transaction.
/// Duplicate names are stored twice; the index keeps the later node.
pub async fn resolve_categories<C>(
    conn: &C,
    visualization_id: i32,
    rows: &[CategoryRow],
    created_at: DateTime<Utc>,
) -> Result<CategoryIndex, DbErr>
where
    C: ConnectionTrait,
{
    let mut index = CategoryIndex::default();

    for row in rows {
        let Some(name) = row.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            warn!(
                "Skipping unnamed category row in visualization {}",
                visualization_id
            );
            continue;
        };

        let category = nodes::ActiveModel {
            visualization_id: Set(visualization_id),
            is_category: Set(true),
            name: Set(name.to_string()),
            short_description: Set(None),
            long_description: Set(None),
            context_url: Set(None),
            credit: Set(None),
            importance: Set(None),
            category_ids: Set(json!([])),
            node_style: Set(row.node_style.clone()),
            label_style: Set(row.label_style.clone()),
            created_at: Set(created_at),
            ..Default::default()
        };
        let id = nodes::Entity::insert(category)
            .exec(conn)
            .await?
            .last_insert_id;

        if let Some(previous) = index.insert(name.to_string(), id) {
            warn!(
                "Duplicate category '{}' in visualization {}: node {} replaces node {}",
                name, visualization_id, id, previous
            );
        }
    }

    debug!(
        "Resolved {} categories for visualization {}",
        index.len(),
        visualization_id
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use sea_orm::{ColumnTrait, QueryFilter, QueryOrder};

    fn category(name: &str) -> CategoryRow {
        CategoryRow {
            name: Some(name.to_string()),
            node_style: Some("fill: red;".to_string()),
            label_style: None,
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let db = setup_test_db().await;
        let index = resolve_categories(&db, 1, &[], Utc::now()).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_creates_one_node_per_row() {
        let db = setup_test_db().await;
        let rows = vec![category("Metal"), category("Punk")];
        let index = resolve_categories(&db, 1, &rows, Utc::now()).await.unwrap();

        assert_eq!(index.names().collect::<Vec<_>>(), vec!["Metal", "Punk"]);
        let stored = nodes::Entity::find()
            .filter(nodes::Column::VisualizationId.eq(1))
            .order_by_asc(nodes::Column::Id)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|node| node.is_category));
        assert_eq!(stored[0].node_style.as_deref(), Some("fill: red;"));
        assert_eq!(index.id_of("Metal"), Some(stored[0].id));
    }

    #[tokio::test]
    async fn test_duplicate_names_last_write_wins() {
        let db = setup_test_db().await;
        let rows = vec![category("Metal"), category("Metal")];
        let index = resolve_categories(&db, 1, &rows, Utc::now()).await.unwrap();

        let stored = nodes::Entity::find()
            .order_by_asc(nodes::Column::Id)
            .all(&db)
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.id_of("Metal"), Some(stored[1].id));
    }

    #[tokio::test]
    async fn test_unnamed_rows_are_skipped() {
        let db = setup_test_db().await;
        let rows = vec![CategoryRow {
            name: None,
            node_style: Some("fill: red;".to_string()),
            label_style: None,
        }];
        let index = resolve_categories(&db, 1, &rows, Utc::now()).await.unwrap();
        assert!(index.is_empty());
        assert!(nodes::Entity::find().all(&db).await.unwrap().is_empty());
    }
}
