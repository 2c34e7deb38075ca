//! Ingestion run error types
//!
//! Only fatal outcomes live here. Every variant means the run was aborted and
//! the visualization's stored dataset was left exactly as it was.

use thiserror::Error;

use super::{AuthError, SourceError};

/// Fatal ingestion errors
#[derive(Error, Debug)]
pub enum IngestionError {
    /// Credential missing or refresh failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Spreadsheet source failed
    #[error("Spreadsheet fetch failed: {0}")]
    Source(#[from] SourceError),

    /// External call exceeded the configured timeout
    #[error("Timed out after {seconds}s while {stage}")]
    Timeout {
        /// What the run was doing
        stage: &'static str,
        /// Configured limit
        seconds: u64,
    },

    /// Another run for the same visualization is in flight
    #[error("Ingestion already running for visualization {0}")]
    AlreadyRunning(i32),

    /// Visualization cannot be ingested as stored
    #[error("Visualization {id} is not ingestible: {reason}")]
    NotIngestible {
        /// Visualization id
        id: i32,
        /// Which required field is missing
        reason: String,
    },

    /// Visualization row was deleted before the replace could commit
    #[error("Visualization {0} no longer exists")]
    VisualizationGone(i32),

    /// Database operation failed, the transaction was rolled back
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error log could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IngestionError {
    /// Check if this is an authentication failure
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, IngestionError::Auth(err) if err.is_authentication_error())
    }

    /// Check if retrying the run later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestionError::Auth(_)
                | IngestionError::Source(_)
                | IngestionError::Timeout { .. }
                | IngestionError::AlreadyRunning(_)
                | IngestionError::Database(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestionError::Auth(err) => err.error_code(),
            IngestionError::Source(err) => err.error_code(),
            IngestionError::Timeout { .. } => "TIMEOUT",
            IngestionError::AlreadyRunning(_) => "CONFLICT",
            IngestionError::NotIngestible { .. } => "VALIDATION_FAILED",
            IngestionError::VisualizationGone(_) => "NOT_FOUND",
            IngestionError::Database(_) => "DATABASE_ERROR",
            IngestionError::Serialization(_) => "INTERNAL_ERROR",
        }
    }
}
