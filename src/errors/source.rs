//! Spreadsheet source error types

use thiserror::Error;

/// Errors raised while reading worksheets from a spreadsheet source.
///
/// A worksheet that does not exist is not an error: sources report it as an
/// empty result.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Spreadsheet id cannot be used to address a workbook
    #[error("Invalid spreadsheet id: {0}")]
    InvalidSpreadsheetId(String),

    /// Reading the workbook from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Worksheet content could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Remote spreadsheet service failed
    #[error("Spreadsheet service error: {0}")]
    Remote(#[from] anyhow::Error),
}

impl SourceError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            SourceError::InvalidSpreadsheetId(_) => "INVALID_SPREADSHEET",
            SourceError::Io(_) | SourceError::Csv(_) | SourceError::Remote(_) => "SOURCE_FAILED",
        }
    }
}
