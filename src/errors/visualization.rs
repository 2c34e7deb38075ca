//! Visualization CRUD error types

use thiserror::Error;

use super::AuthError;

/// Visualization-related errors
#[derive(Error, Debug)]
pub enum VisualizationError {
    /// Visualization not found by ID
    #[error("Visualization {0} not found")]
    NotFound(i32),

    /// Node not found within the visualization
    #[error("Node {node_id} not found in visualization {visualization_id}")]
    NodeNotFound {
        /// Visualization id
        visualization_id: i32,
        /// Node id
        node_id: i32,
    },

    /// Spreadsheet link could not be resolved to a spreadsheet id
    #[error("This URL doesn't look like a valid spreadsheet.")]
    InvalidSpreadsheetLink(String),

    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Access check failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Stored JSON could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VisualizationError {
    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VisualizationError::NotFound(_) | VisualizationError::NodeNotFound { .. }
        )
    }

    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VisualizationError::InvalidSpreadsheetLink(_) | VisualizationError::Validation(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            VisualizationError::NotFound(_) | VisualizationError::NodeNotFound { .. } => {
                "NOT_FOUND"
            }
            VisualizationError::InvalidSpreadsheetLink(_) | VisualizationError::Validation(_) => {
                "VALIDATION_FAILED"
            }
            VisualizationError::Auth(err) => err.error_code(),
            VisualizationError::Database(_) => "DATABASE_ERROR",
            VisualizationError::Serialization(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = VisualizationError::NotFound(42);
        assert_eq!(err.to_string(), "Visualization 42 not found");
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_invalid_link_is_client_error() {
        let err = VisualizationError::InvalidSpreadsheetLink("http://example.com".to_string());
        assert_eq!(
            err.to_string(),
            "This URL doesn't look like a valid spreadsheet."
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_auth_passthrough_code() {
        let err: VisualizationError = AuthError::PermissionDenied("update".to_string()).into();
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert_eq!(err.to_string(), "Permission denied: update");
    }
}
