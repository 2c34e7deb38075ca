//! Consumed collaborators of the ingestion pipeline.
//!
//! The pipeline never talks to OAuth or to a spreadsheet API directly. It asks a
//! [`CredentialProvider`] for a usable credential and hands that credential to a
//! [`SpreadsheetSource`], which returns typed rows. [`GridSpreadsheetSource`]
//! implements the row mapping for any [`WorksheetReader`] that can return raw
//! cell grids; [`CsvWorkbookReader`] is one such reader.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::SourceResult;

pub mod credentials;
pub mod csv_workbook;
pub mod worksheet;

pub use credentials::{Credential, CredentialProvider, LocalCredentialProvider};
pub use csv_workbook::CsvWorkbookReader;
pub use worksheet::{GridSpreadsheetSource, Worksheet, WorksheetReader};

/// CSS class name → declarations, in worksheet order
pub type SimpleCss = IndexMap<String, Vec<String>>;

/// One data row of the categories worksheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub name: Option<String>,
    pub node_style: Option<String>,
    pub label_style: Option<String>,
}

/// One data row of the nodes worksheet, every cell still a string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRow {
    pub name: Option<String>,
    /// Comma-separated category names
    pub categories: Option<String>,
    pub importance: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub context_url: Option<String>,
    pub credit: Option<String>,
    pub node_style: Option<String>,
    pub label_style: Option<String>,
}

/// Read access to a user's spreadsheet.
///
/// A worksheet that does not exist yields an empty result, never an error.
#[async_trait]
pub trait SpreadsheetSource: Send + Sync {
    async fn get_categories(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<Vec<CategoryRow>>;

    async fn get_nodes(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<Vec<NodeRow>>;

    async fn get_simple_css(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<SimpleCss>;

    async fn get_generic_css(
        &self,
        credential: &Credential,
        spreadsheet_id: &str,
    ) -> SourceResult<String>;
}
