pub mod app;
pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use sea_orm_migration::prelude::*;
use tokio::sync::Notify;
use tracing::info;

use crate::config::AppConfig;
use crate::database::{establish_connection, get_database_url, migrations::Migrator};
use crate::services::CleanupService;
use crate::sources::{CsvWorkbookReader, GridSpreadsheetSource, LocalCredentialProvider};

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

pub async fn start_server(config: &AppConfig) -> Result<()> {
    let database_url = get_database_url(Some(&config.database));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let cleanup_notify = Arc::new(Notify::new());
    CleanupService::new(db.clone(), config.cleanup.clone())
        .spawn_worker(config.cleanup.interval(), cleanup_notify.clone());
    info!(
        "Cleanup worker started (every {}s)",
        config.cleanup.interval().as_secs()
    );

    let source = GridSpreadsheetSource::new(
        CsvWorkbookReader::new(config.workbook_dir.clone()),
        &config.ingestion,
    );
    info!("Reading workbooks from {}", config.workbook_dir.display());

    let state = app::AppState::new(
        db,
        config,
        Arc::new(LocalCredentialProvider),
        Arc::new(source),
        cleanup_notify,
    );
    let app = app::create_app(state, config.cors_origin.as_deref())?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                                   - Health check");
    info!("  /api/v1/visualizations                    - List (GET), create (POST)");
    info!("  /api/v1/visualizations/:id                - Read, update, delete");
    info!("  /api/v1/visualizations/:id/refresh        - Re-import spreadsheet (POST)");
    info!("  /api/v1/visualizations/:id/data           - Graph data");
    info!("  /api/v1/visualizations/:id/error-log      - Latest import errors");
    info!("  /api/v1/visualizations/:id/style          - Stylesheet");
    info!("  /api/v1/visualizations/:id/nodes/:node_id - Node detail");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}
