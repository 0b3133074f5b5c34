use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthError;
use crate::config::RefreshPolicy;

use super::{AppError, AppState};

/// Query string the provider appends to the redirect URI
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    /// Set by the provider when the user declined consent
    pub error: Option<String>,
}

/// Body of `GET /token`
#[derive(Debug, Serialize)]
pub struct AccessTokenBody {
    pub access_token: String,
}

/// `302 Found` to `location`
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Redirect the browser to the provider's consent page
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let url = state.oauth.authorization_url().map_err(|e| {
        tracing::error!("Invalid authorize_url in configuration: {}", e);
        AppError::Misconfigured(format!("Invalid authorization URL: {}", e))
    })?;

    Ok(found(url.as_str()))
}

/// Exchange the authorization code and send the browser on to the app
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let code = match params.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => {
            if let Some(ref error) = params.error {
                tracing::warn!("Authorization was not granted: {}", error);
            }
            return Err(AppError::MissingCode);
        }
    };

    match state.oauth.exchange_code(code).await {
        Ok(grant) => {
            tracing::info!(
                has_refresh_token = grant.refresh_token.is_some(),
                "Access token fetched"
            );
            Ok(found(&state.config.post_login_redirect_target))
        }
        Err(e @ (AuthError::Provider { .. } | AuthError::MissingAccessToken)) => {
            tracing::warn!("Token error: {}", e);
            Err(AppError::ProviderToken(e.provider_message()))
        }
        Err(e) => {
            tracing::error!("Token fetch error: {}", e);
            Err(AppError::TokenExchangeFailed)
        }
    }
}

/// Return the cached access token, attempting a refresh first
pub async fn token(State(state): State<Arc<AppState>>) -> Result<Json<AccessTokenBody>, AppError> {
    let unauthenticated =
        || AppError::Unauthenticated("Token not available. Please /login first.".to_string());

    let credentials = state.credentials.snapshot().await;
    if credentials.access_token.is_none() {
        return Err(unauthenticated());
    }

    let should_refresh = match state.config.provider.refresh_policy {
        RefreshPolicy::Always => true,
        RefreshPolicy::WhenExpiring => credentials.needs_refresh(),
    };
    if should_refresh {
        let outcome = state.oauth.refresh().await;
        tracing::debug!(?outcome, "Refresh attempted before /token");
    }

    let access_token = state.credentials.access_token().await.ok_or_else(unauthenticated)?;

    Ok(Json(AccessTokenBody { access_token }))
}
