use std::fmt;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use tracing::error;

use crate::errors::{AuthError, IngestionError, SourceError, VisualizationError};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken from the `x-user-id` header. Anonymous when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser(pub Option<String>);

impl CurrentUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn require(&self) -> Result<&str, ApiError> {
        self.id()
            .ok_or_else(|| AuthError::AuthenticationRequired.into())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(CurrentUser(user))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Error response of every API handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code.to_string(),
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (self.status, Json(self.body())).into_response()
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    if err.is_authorisation_error() {
        StatusCode::FORBIDDEN
    } else {
        StatusCode::UNAUTHORIZED
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::new(auth_status(&err), err.error_code(), err.to_string())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            err.to_string(),
        )
    }
}

impl From<VisualizationError> for ApiError {
    fn from(err: VisualizationError) -> Self {
        let status = match &err {
            VisualizationError::NotFound(_) | VisualizationError::NodeNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            VisualizationError::InvalidSpreadsheetLink(_) | VisualizationError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            VisualizationError::Auth(auth) => auth_status(auth),
            VisualizationError::Database(_) | VisualizationError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err.error_code(), err.to_string())
    }
}

impl From<IngestionError> for ApiError {
    fn from(err: IngestionError) -> Self {
        let status = match &err {
            IngestionError::Auth(auth) => auth_status(auth),
            IngestionError::Source(SourceError::InvalidSpreadsheetId(_)) => StatusCode::BAD_REQUEST,
            IngestionError::Source(_) => StatusCode::BAD_GATEWAY,
            IngestionError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            IngestionError::AlreadyRunning(_) => StatusCode::CONFLICT,
            IngestionError::NotIngestible { .. } => StatusCode::BAD_REQUEST,
            IngestionError::VisualizationGone(_) => StatusCode::NOT_FOUND,
            IngestionError::Database(_) | IngestionError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (VisualizationError::NotFound(1).into(), StatusCode::NOT_FOUND),
            (
                VisualizationError::InvalidSpreadsheetLink("x".to_string()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::AuthenticationRequired.into(), StatusCode::UNAUTHORIZED),
            (
                AuthError::PermissionDenied("x".to_string()).into(),
                StatusCode::FORBIDDEN,
            ),
            (IngestionError::AlreadyRunning(1).into(), StatusCode::CONFLICT),
            (IngestionError::VisualizationGone(1).into(), StatusCode::NOT_FOUND),
            (
                IngestionError::Timeout {
                    stage: "fetching worksheets",
                    seconds: 1,
                }
                .into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                IngestionError::Source(SourceError::Remote(anyhow::anyhow!("503"))).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                IngestionError::Database(DbErr::Custom("boom".to_string())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status, status, "{err}");
        }
    }

    #[test]
    fn test_body_carries_code_and_message() {
        let err: ApiError = VisualizationError::NotFound(9).into();
        assert_eq!(
            err.body(),
            ErrorBody {
                error: "NOT_FOUND".to_string(),
                message: "Visualization 9 not found".to_string(),
            }
        );
    }
}
