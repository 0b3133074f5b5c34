use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::providers::error::ProviderError;

use super::{AppError, AppState};

/// Relay the configured playlist from the resource API
pub async fn playlist(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let access_token = state.credentials.access_token().await.ok_or_else(|| {
        AppError::Unauthenticated("Access token missing. Please login first.".to_string())
    })?;

    match state.playlist_api.fetch_playlist(&access_token).await {
        Ok(body) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()),
        Err(ProviderError::ApiError { status, message }) => {
            tracing::warn!(status, "Spotify API failed: {}", message);
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Err(AppError::Upstream { status, message })
        }
        Err(e) => {
            tracing::error!("Playlist fetch error: {}", e);
            Err(AppError::Transport(
                "Failed to fetch playlist from Spotify".to_string(),
            ))
        }
    }
}
