//! Domain-specific error types for sheetgraph
//!
//! Each domain gets its own `thiserror` enum with an `error_code()` used by the
//! HTTP layer, plus a `Result` alias.
//!
//! # Error Categories
//!
//! - **AuthError**: credential lookup/refresh and access checks
//! - **SourceError**: reading worksheets from a spreadsheet source
//! - **IngestionError**: fatal outcomes of an ingestion run
//! - **VisualizationError**: visualization CRUD and lookups
//!
//! Row-level validation failures are not errors in this sense: they are
//! accumulated into the visualization's error log and never abort a run.
//!
//! # Examples
//!
//! ```rust
//! use sheetgraph::errors::{AuthError, IngestionError};
//!
//! let err: IngestionError = AuthError::CredentialNotFound("user-1".to_string()).into();
//! assert!(err.is_authentication_error());
//! assert_eq!(err.error_code(), "AUTHENTICATION_FAILED");
//! ```

pub mod auth;
pub mod ingestion;
pub mod source;
pub mod visualization;

pub use auth::AuthError;
pub use ingestion::IngestionError;
pub use source::SourceError;
pub use visualization::VisualizationError;

/// Result type alias for credential and access operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type alias for spreadsheet source reads
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type alias for ingestion runs
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Result type alias for visualization operations
pub type VisualizationResult<T> = Result<T, VisualizationError>;
