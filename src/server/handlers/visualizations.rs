use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ApiError, CurrentUser, ErrorBody};
use crate::database::entities::{nodes, visualizations, LogEntry};
use crate::services::projection_service::youtube_id;
use crate::services::{
    ensure_owner, ensure_readable, GraphData, IngestionReport, NewVisualization,
    VisualizationUpdate,
};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateVisualizationRequest {
    pub name: String,
    pub spreadsheet_link: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateVisualizationResponse {
    pub visualization: visualizations::Model,
    /// Outcome of the first ingestion run, when it completed
    pub report: Option<IngestionReport>,
    /// Why the first ingestion run was aborted, when it was
    pub ingestion_error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorLogResponse {
    pub error_log: Option<Vec<LogEntry>>,
}

#[derive(Debug, Serialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: nodes::Model,
    pub youtube_id: Option<String>,
}

/// The caller's visualizations, or every public one with `?public=true`
pub async fn list_visualizations(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<visualizations::Model>>, ApiError> {
    let listed = if query.public {
        state.visualizations.list_public().await?
    } else {
        state.visualizations.list_for_user(user.require()?).await?
    };
    Ok(Json(listed))
}

/// Store a new visualization and run its first ingestion.
///
/// A fatal ingestion error does not undo the creation: the visualization is
/// returned together with the error so the caller can fix the spreadsheet and
/// refresh.
pub async fn create_visualization(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateVisualizationRequest>,
) -> Result<(StatusCode, Json<CreateVisualizationResponse>), ApiError> {
    let user_id = user.require()?.to_string();
    let visualization = state
        .visualizations
        .create(NewVisualization {
            user_id,
            name: payload.name,
            spreadsheet_link: payload.spreadsheet_link,
            is_public: payload.is_public,
        })
        .await?;

    let (report, ingestion_error) = match state.ingestion.run_ingestion(&visualization).await {
        Ok(report) => (Some(report), None),
        Err(err) => {
            warn!(
                "First ingestion of visualization {} failed: {}",
                visualization.id, err
            );
            (None, Some(ApiError::from(err).body()))
        }
    };

    // Ingestion may have moved the timestamps
    let visualization = state.visualizations.get(visualization.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateVisualizationResponse {
            visualization,
            report,
            ingestion_error,
        }),
    ))
}

pub async fn get_visualization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<visualizations::Model>, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_readable(&visualization, user.id())?;
    Ok(Json(visualization))
}

pub async fn update_visualization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
    Json(update): Json<VisualizationUpdate>,
) -> Result<Json<visualizations::Model>, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_owner(&visualization, user.id())?;
    let updated = state.visualizations.update(&visualization, update).await?;
    Ok(Json(updated))
}

pub async fn delete_visualization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_owner(&visualization, user.id())?;
    state.visualizations.delete(&visualization).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_visualization(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<IngestionReport>, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_owner(&visualization, user.id())?;

    let report = state.ingestion.run_ingestion(&visualization).await?;
    info!(
        "Refreshed visualization {}: {} nodes, {} rejected rows",
        id, report.nodes, report.rejected_rows
    );
    Ok(Json(report))
}

pub async fn get_graph_data(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<GraphData>, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_readable(&visualization, user.id())?;
    let graph = state.projection.project_graph_data(&visualization).await?;
    Ok(Json(graph))
}

pub async fn get_error_log(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ErrorLogResponse>, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_owner(&visualization, user.id())?;
    let error_log = state.visualizations.current_error_log(&visualization).await?;
    Ok(Json(ErrorLogResponse { error_log }))
}

pub async fn get_style(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_readable(&visualization, user.id())?;
    let css = state
        .visualizations
        .current_style(&visualization)
        .await?
        .unwrap_or_default();
    Ok(([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response())
}

pub async fn get_node(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, node_id)): Path<(i32, i32)>,
) -> Result<Json<NodeDetail>, ApiError> {
    let visualization = state.visualizations.get(id).await?;
    ensure_readable(&visualization, user.id())?;
    let node = state.visualizations.get_node(&visualization, node_id).await?;
    let youtube_id = node.context_url.as_deref().and_then(youtube_id);
    Ok(Json(NodeDetail { node, youtube_id }))
}
