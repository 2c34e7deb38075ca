use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tokio::sync::Notify;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{health, visualizations};
use crate::config::AppConfig;
use crate::services::{IngestionService, ProjectionService, VisualizationService};
use crate::sources::{CredentialProvider, SpreadsheetSource};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub visualizations: VisualizationService,
    pub ingestion: IngestionService,
    pub projection: ProjectionService,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: &AppConfig,
        credentials: Arc<dyn CredentialProvider>,
        source: Arc<dyn SpreadsheetSource>,
        cleanup_notify: Arc<Notify>,
    ) -> Self {
        Self {
            visualizations: VisualizationService::new(db.clone())
                .with_cleanup_notify(cleanup_notify),
            ingestion: IngestionService::new(
                db.clone(),
                credentials,
                source,
                config.ingestion.clone(),
            ),
            projection: ProjectionService::new(db.clone()),
            db,
        }
    }
}

pub fn create_app(state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::PUT,
        axum::http::Method::DELETE,
        axum::http::Method::OPTIONS,
    ];

    // "*" is not a valid exact origin for tower-http
    let cors = match cors_origin.filter(|origin| *origin != "*") {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/visualizations",
            get(visualizations::list_visualizations).post(visualizations::create_visualization),
        )
        .route(
            "/api/v1/visualizations/:id",
            get(visualizations::get_visualization)
                .put(visualizations::update_visualization)
                .delete(visualizations::delete_visualization),
        )
        .route(
            "/api/v1/visualizations/:id/refresh",
            post(visualizations::refresh_visualization),
        )
        .route(
            "/api/v1/visualizations/:id/data",
            get(visualizations::get_graph_data),
        )
        .route(
            "/api/v1/visualizations/:id/error-log",
            get(visualizations::get_error_log),
        )
        .route(
            "/api/v1/visualizations/:id/style",
            get(visualizations::get_style),
        )
        .route(
            "/api/v1/visualizations/:id/nodes/:node_id",
            get(visualizations::get_node),
        )
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}
