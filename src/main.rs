use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use sheetgraph::config::AppConfig;
use sheetgraph::database::{establish_connection, get_database_url, migrations::Migrator};
use sheetgraph::server::{self, MigrateDirection};
use sheetgraph::services::{IngestionService, VisualizationService};
use sheetgraph::sources::{CsvWorkbookReader, GridSpreadsheetSource, LocalCredentialProvider};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    /// TOML configuration file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
        #[clap(short, long)]
        database: Option<String>,
        #[clap(long)]
        cors_origin: Option<String>,
        #[clap(long)]
        workbook_dir: Option<PathBuf>,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    /// Re-import one visualization from its spreadsheet and print the report
    Ingest {
        id: i32,
        #[clap(short, long)]
        database: Option<String>,
        #[clap(long)]
        workbook_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Migrate {
        #[clap(subcommand)]
        direction: MigrateDirection,
        #[clap(short, long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    let mut config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Serve {
            port,
            database,
            cors_origin,
            workbook_dir,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database) = database {
                config.database = database;
            }
            if cors_origin.is_some() {
                config.cors_origin = cors_origin;
            }
            if let Some(dir) = workbook_dir {
                config.workbook_dir = dir;
            }
            info!("Starting server on port {}", config.port);
            server::start_server(&config).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Migrate {
                direction,
                database,
            } => {
                let database = database.unwrap_or(config.database);
                info!("Running database migration: {:?}", direction);
                server::migrate_database(&database, direction).await?;
            }
        },
        Commands::Ingest {
            id,
            database,
            workbook_dir,
        } => {
            if let Some(database) = database {
                config.database = database;
            }
            if let Some(dir) = workbook_dir {
                config.workbook_dir = dir;
            }
            ingest(&config, id).await?;
        }
    }

    Ok(())
}

async fn ingest(config: &AppConfig, id: i32) -> Result<()> {
    let db = establish_connection(&get_database_url(Some(&config.database))).await?;
    Migrator::up(&db, None).await?;

    let visualization = VisualizationService::new(db.clone()).get(id).await?;
    info!(
        "Ingesting visualization {} ('{}') from spreadsheet {}",
        visualization.id, visualization.name, visualization.spreadsheet_id
    );

    let source = GridSpreadsheetSource::new(
        CsvWorkbookReader::new(config.workbook_dir.clone()),
        &config.ingestion,
    );
    let service = IngestionService::new(
        db,
        Arc::new(LocalCredentialProvider),
        Arc::new(source),
        config.ingestion.clone(),
    );

    let report = service.run_ingestion(&visualization).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sea_orm_migration=warn,{}", log_level)))
        .init();
}
