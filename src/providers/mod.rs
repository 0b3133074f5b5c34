pub mod error;

use bytes::Bytes;
use error::ProviderError;
use serde::Deserialize;

use crate::config::ProviderConfig;

/// Error envelope of the Spotify Web API: `{"error": {"status": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Read-only client for the provider's playlist resource
#[derive(Debug, Clone)]
pub struct PlaylistApi {
    base_url: String,
    playlist_id: String,
    http_client: reqwest::Client,
}

impl PlaylistApi {
    pub fn new(config: &ProviderConfig, http_client: reqwest::Client) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            playlist_id: config.playlist_id.clone(),
            http_client,
        }
    }

    pub fn playlist_url(&self) -> String {
        format!("{}/playlists/{}", self.base_url, self.playlist_id)
    }

    /// Fetch the configured playlist, returning the upstream body untouched
    pub async fn fetch_playlist(&self, access_token: &str) -> Result<Bytes, ProviderError> {
        let response = self
            .http_client
            .get(self.playlist_url())
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Pull `error.message` out of an upstream error body, falling back to the
/// status' canonical reason
fn error_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Upstream request failed")
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> PlaylistApi {
        let config = ProviderConfig {
            api_base_url: base_url.to_string(),
            playlist_id: "pl1".to_string(),
            ..Default::default()
        };
        PlaylistApi::new(&config, reqwest::Client::new())
    }

    #[test]
    fn test_playlist_url() {
        assert_eq!(
            api("https://api.spotify.com/v1/").playlist_url(),
            "https://api.spotify.com/v1/playlists/pl1"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        let body = br#"{"error":{"status":401,"message":"The access token expired"}}"#;
        assert_eq!(
            error_message(reqwest::StatusCode::UNAUTHORIZED, body),
            "The access token expired"
        );
        assert_eq!(
            error_message(reqwest::StatusCode::BAD_GATEWAY, b"<html>oops</html>"),
            "Bad Gateway"
        );
    }

    #[tokio::test]
    async fn test_fetch_playlist_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/playlists/pl1")
            .match_header("authorization", "Bearer tok")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"pl1"}"#)
            .create_async()
            .await;

        let body = api(&server.url()).fetch_playlist("tok").await.unwrap();

        mock.assert_async().await;
        assert_eq!(&body[..], br#"{"id":"pl1"}"#);
    }

    #[tokio::test]
    async fn test_fetch_playlist_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/playlists/pl1")
            .with_status(429)
            .with_body(r#"{"error":{"status":429,"message":"API rate limit exceeded"}}"#)
            .create_async()
            .await;

        let err = api(&server.url()).fetch_playlist("tok").await.unwrap_err();

        match err {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "API rate limit exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
