use crate::auth::{CredentialStore, OAuthClient, OAuthConfig};
use crate::config::AppConfig;
use crate::providers::PlaylistApi;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: CredentialStore,
    pub oauth: OAuthClient,
    pub playlist_api: PlaylistApi,
}

impl AppState {
    /// Build the state with a fresh, empty credential cell
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        // No timeout: a hung upstream call only holds its own request open
        let http_client = reqwest::Client::builder().build()?;
        let credentials = CredentialStore::new();

        let oauth = OAuthClient::new(
            OAuthConfig::from(&config.provider),
            credentials.clone(),
            http_client.clone(),
        );
        let playlist_api = PlaylistApi::new(&config.provider, http_client);

        Ok(Self {
            config: Arc::new(config),
            credentials,
            oauth,
            playlist_api,
        })
    }
}
