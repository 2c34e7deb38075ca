pub mod error;
pub mod health;
pub mod visualizations;

pub use error::{ApiError, CurrentUser, USER_ID_HEADER};
