use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::database::entities::{nodes, visualizations};

const YOUTUBE_HOST: &str = "www.youtube.com";

/// Force-graph payload: category nodes first, then data nodes, and one link
/// per category membership. Link ends are positions in `nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphNode {
    Category(CategoryNode),
    Data(DataNode),
}

impl GraphNode {
    pub fn name(&self) -> &str {
        match self {
            GraphNode::Category(category) => &category.name,
            GraphNode::Data(node) => &node.name,
        }
    }

    pub fn group(&self) -> Option<usize> {
        match self {
            GraphNode::Category(category) => Some(category.group),
            GraphNode::Data(node) => node.group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub name: String,
    pub is_category: bool,
    pub node_style: String,
    pub label_style: String,
    /// 1-based position among the categories
    pub group: usize,
    pub importance: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNode {
    pub name: String,
    pub context_url: String,
    pub short_description: String,
    pub long_description: String,
    pub credit: String,
    pub youtube_id: Option<String>,
    pub node_style: String,
    pub label_style: String,
    pub importance: i32,
    /// Group of the first listed category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
}

/// Video id of a `www.youtube.com` link, taken from its `v` query parameter
pub fn youtube_id(context_url: &str) -> Option<String> {
    let url = Url::parse(context_url.trim()).ok()?;
    if url.host_str() != Some(YOUTUBE_HOST) {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Clone)]
pub struct ProjectionService {
    db: DatabaseConnection,
}

impl ProjectionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn project_graph_data(
        &self,
        visualization: &visualizations::Model,
    ) -> Result<GraphData, DbErr> {
        let stored = nodes::Entity::find()
            .filter(nodes::Column::VisualizationId.eq(visualization.id))
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;

        let graph = project_nodes(visualization.id, &stored);
        debug!(
            "Projected visualization {}: {} nodes, {} links",
            visualization.id,
            graph.nodes.len(),
            graph.links.len()
        );
        Ok(graph)
    }
}

/// Build the payload from nodes already ordered by id
pub fn project_nodes(visualization_id: i32, stored: &[nodes::Model]) -> GraphData {
    let (categories, data): (Vec<&nodes::Model>, Vec<&nodes::Model>) =
        stored.iter().partition(|node| node.is_category);

    let mut graph = GraphData::default();
    let mut positions: HashMap<i32, usize> = HashMap::new();

    for (index, category) in categories.iter().enumerate() {
        graph.nodes.push(GraphNode::Category(CategoryNode {
            name: category.name.clone(),
            is_category: true,
            node_style: category.node_style.clone().unwrap_or_default(),
            label_style: category.label_style.clone().unwrap_or_default(),
            group: index + 1,
            importance: 0,
        }));
        positions.insert(category.id, index);
    }

    let start = graph.nodes.len();
    for (index, node) in data.iter().enumerate() {
        let source = start + index;
        let mut group = None;

        for category_id in node.category_ids() {
            let Some(&target) = positions.get(&category_id) else {
                warn!(
                    "Node {} of visualization {} references unknown category {}",
                    node.id, visualization_id, category_id
                );
                continue;
            };
            graph.links.push(GraphLink { source, target });
            group.get_or_insert(target + 1);
        }

        let context_url = node.context_url.clone().unwrap_or_default();
        graph.nodes.push(GraphNode::Data(DataNode {
            name: node.name.clone(),
            youtube_id: youtube_id(&context_url),
            context_url,
            short_description: node.short_description.clone().unwrap_or_default(),
            long_description: node.long_description.clone().unwrap_or_default(),
            credit: node.credit.clone().unwrap_or_default(),
            node_style: node.node_style.clone().unwrap_or_default(),
            label_style: node.label_style.clone().unwrap_or_default(),
            importance: node.importance.unwrap_or(1),
            group,
        }));
    }

    graph
}
