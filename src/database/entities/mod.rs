pub mod cleanup_tasks;
pub mod error_logs;
pub mod nodes;
pub mod styles;
pub mod visualizations;

pub use error_logs::{FieldErrors, LogEntry};
