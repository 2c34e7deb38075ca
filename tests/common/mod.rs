//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use sheetgraph::config::IngestionConfig;
use sheetgraph::database::entities::visualizations;
use sheetgraph::database::migrations::Migrator;
use sheetgraph::errors::{AuthError, AuthResult, SourceError, SourceResult};
use sheetgraph::services::IngestionService;
use sheetgraph::sources::{
    CategoryRow, Credential, CredentialProvider, LocalCredentialProvider, NodeRow, SimpleCss,
    SpreadsheetSource,
};

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn insert_visualization(
    db: &DatabaseConnection,
    user_id: &str,
    spreadsheet_id: &str,
) -> visualizations::Model {
    let mut active = visualizations::ActiveModel::new();
    active.name = Set(format!("{spreadsheet_id} graph"));
    active.user_id = Set(user_id.to_string());
    active.spreadsheet_id = Set(spreadsheet_id.to_string());
    active.insert(db).await.expect("Failed to insert visualization")
}

pub fn category(name: &str) -> CategoryRow {
    CategoryRow {
        name: Some(name.to_string()),
        node_style: Some(format!("fill: {};", name.to_lowercase())),
        label_style: None,
    }
}

pub fn node(name: &str, categories: &str, importance: &str) -> NodeRow {
    NodeRow {
        name: Some(name.to_string()).filter(|v| !v.is_empty()),
        categories: Some(categories.to_string()).filter(|v| !v.is_empty()),
        importance: Some(importance.to_string()).filter(|v| !v.is_empty()),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub categories: Vec<CategoryRow>,
    pub nodes: Vec<NodeRow>,
    pub simple_css: SimpleCss,
    pub generic_css: String,
}

impl SheetData {
    /// Two categories, three valid nodes and one invalid node on sheet row 5
    pub fn sample() -> Self {
        let mut simple_css = SimpleCss::new();
        simple_css.insert("metal".to_string(), vec!["stroke: #f00;".to_string()]);

        let mut bruce = node("Bruce Dickinson", "Metal", "10");
        bruce.context_url = Some("https://www.youtube.com/watch?v=abc123".to_string());
        bruce.short_description = Some("Singer".to_string());

        Self {
            categories: vec![category("Metal"), category("Punk")],
            nodes: vec![
                bruce,
                node("Joe Strummer", "Punk", "8"),
                node("Lemmy", "Punk, Metal", "30"),
                node("Nobody", "Jazz", "100"),
            ],
            simple_css,
            generic_css: "svg { background: #000; }".to_string(),
        }
    }
}

/// In-memory spreadsheet with optional latency and failure injection
#[derive(Default)]
pub struct StaticSpreadsheetSource {
    data: Mutex<SheetData>,
    delay: Option<Duration>,
    fail: bool,
    fetches: AtomicUsize,
}

impl StaticSpreadsheetSource {
    pub fn new(data: SheetData) -> Self {
        Self {
            data: Mutex::new(data),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn set_data(&self, data: SheetData) {
        *self.data.lock().unwrap() = data;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn read<T>(&self, pick: impl FnOnce(&SheetData) -> T) -> SourceResult<T> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::Remote(anyhow::anyhow!("spreadsheet service unavailable")));
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();
        Ok(pick(&data))
    }
}

#[async_trait]
impl SpreadsheetSource for StaticSpreadsheetSource {
    async fn get_categories(&self, _: &Credential, _: &str) -> SourceResult<Vec<CategoryRow>> {
        self.read(|data| data.categories.clone()).await
    }

    async fn get_nodes(&self, _: &Credential, _: &str) -> SourceResult<Vec<NodeRow>> {
        self.read(|data| data.nodes.clone()).await
    }

    async fn get_simple_css(&self, _: &Credential, _: &str) -> SourceResult<SimpleCss> {
        self.read(|data| data.simple_css.clone()).await
    }

    async fn get_generic_css(&self, _: &Credential, _: &str) -> SourceResult<String> {
        self.read(|data| data.generic_css.clone()).await
    }
}

/// Credential provider with a fixed answer and a scripted refresh outcome
pub struct MockCredentialProvider {
    credential: Option<Credential>,
    refresh_error: Option<AuthError>,
    refreshes: AtomicUsize,
}

impl MockCredentialProvider {
    pub fn valid() -> Self {
        Self::with(Some(Credential::new("token", None)), None)
    }

    pub fn missing() -> Self {
        Self::with(None, None)
    }

    pub fn expired() -> Self {
        Self::with(
            Some(Credential::new(
                "stale",
                Some(Utc::now() - chrono::Duration::hours(1)),
            )),
            None,
        )
    }

    pub fn expired_and_revoked() -> Self {
        Self::with(
            Some(Credential::new(
                "stale",
                Some(Utc::now() - chrono::Duration::hours(1)),
            )),
            Some(AuthError::RefreshFailed("token revoked".to_string())),
        )
    }

    fn with(credential: Option<Credential>, refresh_error: Option<AuthError>) -> Self {
        Self {
            credential,
            refresh_error,
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for MockCredentialProvider {
    async fn get_credential(&self, _user_id: &str) -> AuthResult<Option<Credential>> {
        Ok(self.credential.clone())
    }

    async fn refresh(&self, _user_id: &str, _credential: Credential) -> AuthResult<Credential> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match &self.refresh_error {
            Some(err) => Err(err.clone()),
            None => Ok(Credential::new(
                "fresh",
                Some(Utc::now() + chrono::Duration::hours(1)),
            )),
        }
    }
}

pub fn ingestion_service(
    db: &DatabaseConnection,
    credentials: Arc<dyn CredentialProvider>,
    source: Arc<dyn SpreadsheetSource>,
) -> IngestionService {
    IngestionService::new(db.clone(), credentials, source, IngestionConfig::default())
}

pub fn local_ingestion_service(
    db: &DatabaseConnection,
    source: Arc<StaticSpreadsheetSource>,
) -> IngestionService {
    ingestion_service(db, Arc::new(LocalCredentialProvider), source)
}
