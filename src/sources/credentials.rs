use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AuthResult;

/// An access credential for a user's spreadsheets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    /// `None` for credentials that never expire
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Supplies credentials for a user id.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// The stored credential for `user_id`, if any. May be expired.
    async fn get_credential(&self, user_id: &str) -> AuthResult<Option<Credential>>;

    /// Exchange an expired credential for a fresh one and store it.
    async fn refresh(&self, user_id: &str, credential: Credential) -> AuthResult<Credential>;
}

/// Credential provider for single-tenant deployments whose spreadsheet source
/// needs no authorisation, such as the CSV workbook reader.
#[derive(Debug, Clone, Default)]
pub struct LocalCredentialProvider;

#[async_trait]
impl CredentialProvider for LocalCredentialProvider {
    async fn get_credential(&self, user_id: &str) -> AuthResult<Option<Credential>> {
        Ok(Some(Credential::new(format!("local:{user_id}"), None)))
    }

    async fn refresh(&self, _user_id: &str, credential: Credential) -> AuthResult<Credential> {
        Ok(Credential {
            expires_at: None,
            ..credential
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry() {
        let past = Credential::new("t", Some(Utc::now() - Duration::minutes(1)));
        let future = Credential::new("t", Some(Utc::now() + Duration::minutes(10)));
        let never = Credential::new("t", None);
        assert!(past.is_expired());
        assert!(!future.is_expired());
        assert!(!never.is_expired());
    }

    #[tokio::test]
    async fn test_local_provider_never_expires() {
        let provider = LocalCredentialProvider;
        let credential = provider.get_credential("alice").await.unwrap().unwrap();
        assert_eq!(credential.access_token, "local:alice");
        assert!(!credential.is_expired());
    }
}
