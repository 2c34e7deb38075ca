pub mod category_resolver;
pub mod cleanup_service;
pub mod ingestion_service;
pub mod projection_service;
pub mod style_aggregator;
pub mod validation;
pub mod visualization_service;

pub use category_resolver::{resolve_categories, CategoryIndex};
pub use cleanup_service::{CleanupService, CleanupSummary};
pub use ingestion_service::{IngestionReport, IngestionService, IngestionStage};
pub use projection_service::{GraphData, GraphLink, GraphNode, ProjectionService};
pub use style_aggregator::aggregate_styles;
pub use validation::{validate_node, ImportanceRange};
pub use visualization_service::{
    ensure_owner, ensure_readable, parse_spreadsheet_link, NewVisualization,
    VisualizationService, VisualizationUpdate,
};
