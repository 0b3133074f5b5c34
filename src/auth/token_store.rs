use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cached provider credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token for the resource API
    pub access_token: Option<String>,
    /// Used to mint a new access token without another login
    pub refresh_token: Option<String>,
    /// Expiration time (UTC), when the provider reported one
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Check if token will expire soon (within 5 minutes) or has no known expiry
    pub fn needs_refresh(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() + Duration::minutes(5) >= at,
            None => true,
        }
    }
}

/// Process-wide credential cell shared by every handler.
///
/// Lives only in memory and is empty at startup. Every write goes through
/// one of the methods below under the write lock, and no lock is held across
/// an outbound request.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<Credentials>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current credentials
    pub async fn snapshot(&self) -> Credentials {
        self.inner.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.inner.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.read().await.refresh_token.clone()
    }

    /// Replace everything after a successful code exchange
    pub async fn store_grant(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        let mut credentials = self.inner.write().await;
        *credentials = Credentials {
            access_token: non_empty(Some(access_token)),
            refresh_token: non_empty(refresh_token),
            expires_at,
        };
    }

    /// Swap in a refreshed access token, keeping the refresh token
    pub async fn store_refreshed(&self, access_token: String, expires_at: Option<DateTime<Utc>>) {
        let mut credentials = self.inner.write().await;
        credentials.access_token = non_empty(Some(access_token));
        credentials.expires_at = expires_at;
    }

    /// Seed the cell directly
    pub async fn replace(&self, credentials: Credentials) {
        *self.inner.write().await = credentials;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_credential_store() {
        let store = CredentialStore::new();
        assert_eq!(store.snapshot().await, Credentials::default());

        store
            .store_grant("access-123".to_string(), Some("refresh-456".to_string()), None)
            .await;
        assert_eq!(store.access_token().await.as_deref(), Some("access-123"));
        assert_eq!(store.refresh_token().await.as_deref(), Some("refresh-456"));

        store.store_refreshed("access-789".to_string(), None).await;
        assert_eq!(store.access_token().await.as_deref(), Some("access-789"));
        assert_eq!(store.refresh_token().await.as_deref(), Some("refresh-456"));
    }

    #[tokio::test]
    async fn test_empty_refresh_token_is_absent() {
        let store = CredentialStore::new();
        store
            .store_grant("access".to_string(), Some(String::new()), None)
            .await;

        assert_eq!(store.refresh_token().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = CredentialStore::new();
        let other = store.clone();

        other.store_grant("shared".to_string(), None, None).await;

        assert_eq!(store.access_token().await.as_deref(), Some("shared"));
    }

    #[test]
    fn test_token_expiration() {
        let expired = Credentials {
            access_token: Some("token".to_string()),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now() - Duration::hours(1)),
        };

        assert!(expired.needs_refresh());

        let valid = Credentials {
            expires_at: Some(Utc::now() + Duration::hours(1)),
            ..expired.clone()
        };

        assert!(!valid.needs_refresh());

        let unknown = Credentials {
            expires_at: None,
            ..expired
        };

        assert!(unknown.needs_refresh());
    }
}
