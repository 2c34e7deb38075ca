//! Authentication and authorisation error types
//!
//! # Examples
//!
//! ```rust
//! use sheetgraph::errors::AuthError;
//!
//! let err = AuthError::RefreshFailed("token revoked".to_string());
//! assert!(err.is_authentication_error());
//!
//! let err = AuthError::PermissionDenied("delete visualization 4".to_string());
//! assert_eq!(err.error_code(), "FORBIDDEN");
//! ```

use thiserror::Error;

/// Authentication and authorisation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No stored credential for the user
    #[error("No credential available for user '{0}'")]
    CredentialNotFound(String),

    /// Credential was expired and could not be refreshed
    #[error("Credential refresh failed: {0}")]
    RefreshFailed(String),

    /// Caller did not identify itself
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Caller is known but may not perform the action
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl AuthError {
    /// Check if this is an authentication error (401)
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            AuthError::CredentialNotFound(_)
                | AuthError::RefreshFailed(_)
                | AuthError::AuthenticationRequired
        )
    }

    /// Check if this is an authorisation error (403)
    pub fn is_authorisation_error(&self) -> bool {
        matches!(self, AuthError::PermissionDenied(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::CredentialNotFound(_)
            | AuthError::RefreshFailed(_)
            | AuthError::AuthenticationRequired => "AUTHENTICATION_FAILED",
            AuthError::PermissionDenied(_) => "FORBIDDEN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_not_found() {
        let err = AuthError::CredentialNotFound("u-1".to_string());
        assert_eq!(err.to_string(), "No credential available for user 'u-1'");
        assert!(err.is_authentication_error());
        assert!(!err.is_authorisation_error());
    }

    #[test]
    fn test_permission_denied() {
        let err = AuthError::PermissionDenied("refresh".to_string());
        assert_eq!(err.to_string(), "Permission denied: refresh");
        assert!(err.is_authorisation_error());
        assert_eq!(err.error_code(), "FORBIDDEN");
    }
}
