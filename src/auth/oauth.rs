use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use thiserror::Error;

use super::token_store::CredentialStore;
use crate::config::ProviderConfig;

/// Token endpoint failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("Provider rejected the grant: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },

    #[error("Token response carried no access token")]
    MissingAccessToken,
}

impl AuthError {
    /// Message suitable for the caller: the provider's description when present
    pub fn provider_message(&self) -> String {
        match self {
            AuthError::Provider { error, description } => {
                description.clone().unwrap_or_else(|| error.clone())
            }
            other => other.to_string(),
        }
    }
}

/// OAuth provider configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl From<&ProviderConfig> for OAuthConfig {
    fn from(provider: &ProviderConfig) -> Self {
        Self {
            client_id: provider.client_id.clone(),
            client_secret: provider.client_secret.clone(),
            auth_url: provider.authorize_url.clone(),
            token_url: provider.token_url.clone(),
            redirect_uri: provider.redirect_uri.clone(),
            scopes: provider.scopes.clone(),
        }
    }
}

impl OAuthConfig {
    /// `Basic` credential built from `client_id:client_secret`
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

/// Raw token endpoint response. Spotify answers errors with a JSON body as
/// well, so both shapes share one struct.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    /// Seconds; read leniently so an odd value never rejects the grant
    expires_in: Option<serde_json::Value>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Tokens obtained from a successful exchange
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of a best-effort refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh token cached
    Skipped,
    Refreshed,
    /// Logged and absorbed; credentials were left untouched
    Failed,
}

/// OAuth client for the authorization code flow
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    credentials: CredentialStore,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Create a new OAuth client
    pub fn new(
        config: OAuthConfig,
        credentials: CredentialStore,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            credentials,
            http_client,
        }
    }

    /// Build the provider authorization URL
    pub fn authorization_url(&self) -> Result<url::Url, url::ParseError> {
        let mut url = url::Url::parse(&self.config.auth_url)?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("redirect_uri", &self.config.redirect_uri);

        Ok(url)
    }

    /// Exchange an authorization code for tokens and cache them
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        let form = [
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self.request_token(&form).await?;
        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        let grant = TokenGrant {
            access_token,
            refresh_token: response.refresh_token,
            expires_at: expires_at(response.expires_in.as_ref()),
        };

        self.credentials
            .store_grant(
                grant.access_token.clone(),
                grant.refresh_token.clone(),
                grant.expires_at,
            )
            .await;

        Ok(grant)
    }

    /// Refresh the cached access token.
    ///
    /// Never fails: errors are logged and the cached credentials stay as they were.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.credentials.refresh_token().await else {
            return RefreshOutcome::Skipped;
        };

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        let response = match self.request_token(&form).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                return RefreshOutcome::Failed;
            }
        };

        match response.access_token.filter(|token| !token.is_empty()) {
            Some(access_token) => {
                self.credentials
                    .store_refreshed(access_token, expires_at(response.expires_in.as_ref()))
                    .await;
                tracing::debug!("Access token refreshed");
                RefreshOutcome::Refreshed
            }
            None => {
                tracing::warn!("Token refresh failed: {}", AuthError::MissingAccessToken);
                RefreshOutcome::Failed
            }
        }
    }

    /// POST a form to the token endpoint. The body is inspected for an
    /// `error` field whatever the status code.
    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .header(reqwest::header::AUTHORIZATION, self.config.basic_auth_header())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let token_response: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            AuthError::InvalidResponse(format!("{} ({})", e, status))
        })?;

        if let Some(error) = token_response.error {
            return Err(AuthError::Provider {
                error,
                description: token_response.error_description,
            });
        }

        Ok(token_response)
    }
}

/// Absolute expiry from `expires_in`. Anything unusable or out of range
/// yields `None`, which callers treat as unknown expiry.
fn expires_at(expires_in: Option<&serde_json::Value>) -> Option<DateTime<Utc>> {
    let value = expires_in?;
    let secs = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))?;

    let delta = TimeDelta::try_seconds(secs)?;
    Utc::now().checked_add_signed(delta)
}
