//! OAuth access tokens for the Google APIs.

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};

use crate::config::Credentials;
use crate::error::{SheetsError, SheetsResult};

/// Scopes requested for service-account tokens.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// Supplies bearer tokens for outgoing requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> SheetsResult<String>;
}

/// A fixed token, for tests and pre-authorized environments.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> SheetsResult<String> {
        Ok(self.0.clone())
    }
}

/// Tokens minted from a service-account JSON key.
///
/// `gcp_auth` caches tokens and refreshes them before expiry.
pub struct ServiceAccountTokens {
    account: CustomServiceAccount,
}

impl ServiceAccountTokens {
    pub fn from_credentials(credentials: &Credentials) -> SheetsResult<Self> {
        let account = CustomServiceAccount::from_file(&credentials.key_path).map_err(|e| {
            SheetsError::Auth(format!(
                "Cannot load service account key {}: {}",
                credentials.key_path.display(),
                e
            ))
        })?;
        Ok(Self { account })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> SheetsResult<String> {
        let token = self
            .account
            .token(SCOPES)
            .await
            .map_err(|e| SheetsError::Auth(format!("Token request failed: {}", e)))?;
        Ok(token.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_static_token() {
        let source = StaticToken::new("abc");
        assert_eq!(source.access_token().await.unwrap(), "abc");
    }

    #[test]
    fn test_malformed_key_is_auth_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"type\": \"not a key\"}}").unwrap();
        let credentials = Credentials::from_path(file.path()).unwrap();

        let result = ServiceAccountTokens::from_credentials(&credentials);
        assert!(matches!(result, Err(SheetsError::Auth(_))));
    }
}
