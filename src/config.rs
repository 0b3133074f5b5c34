use serde::{Deserialize, Serialize};
use std::path::Path;
use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Where the browser is sent after a successful code exchange.
    /// Either a local path ("/") or an external front-end URL.
    #[serde(default = "default_post_login_redirect")]
    pub post_login_redirect_target: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            post_login_redirect_target: default_post_login_redirect(),
        }
    }
}

fn default_post_login_redirect() -> String {
    "/".to_string()
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory served for every path not claimed by the relay routes
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            log_level: default_log_level(),
            public_dir: default_public_dir(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

/// When `/token` attempts a refresh exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Refresh on every `/token` call, whatever the cached expiry says
    #[default]
    Always,
    /// Refresh only when the expiry is unknown or less than five minutes away
    WhenExpiring,
}

/// Upstream provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Playlist proxied by `/playlist`
    #[serde(default = "default_playlist_id")]
    pub playlist_id: String,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
            scopes: default_scopes(),
            playlist_id: default_playlist_id(),
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

fn default_authorize_url() -> String {
    "https://accounts.spotify.com/authorize".to_string()
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "user-read-playback-state".to_string(),
        "user-modify-playback-state".to_string(),
        "streaming".to_string(),
    ]
}

fn default_playlist_id() -> String {
    "5ZLzQVTP13MFjQLOeCsygX".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides()?;
        config.resolve_env_vars()?;

        Ok(config)
    }

    /// Parse a TOML configuration file as-is
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Environment variables win over the file
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("SPOTIFY_CLIENT_ID") {
            self.provider.client_id = value;
        }
        if let Ok(value) = std::env::var("SPOTIFY_CLIENT_SECRET") {
            self.provider.client_secret = value;
        }
        if let Ok(value) = std::env::var("SPOTIFY_REDIRECT_URI") {
            self.provider.redirect_uri = value;
        }
        if let Ok(value) = std::env::var("RELAY_POST_LOGIN_REDIRECT") {
            self.post_login_redirect_target = value;
        }
        if let Ok(value) = std::env::var("PORT") {
            self.server.port = value
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", value))?;
        }

        Ok(())
    }

    /// Resolve `$VAR` references in credential fields
    fn resolve_env_vars(&mut self) -> Result<()> {
        let provider = &mut self.provider;
        for (name, field) in [
            ("client_id", &mut provider.client_id),
            ("client_secret", &mut provider.client_secret),
            ("redirect_uri", &mut provider.redirect_uri),
        ] {
            if let Some(env_var) = field.strip_prefix('$').map(str::to_owned) {
                match std::env::var(&env_var) {
                    Ok(value) => *field = value,
                    Err(_) => anyhow::bail!(
                        "Environment variable {} not found for provider.{}",
                        env_var,
                        name
                    ),
                }
            }
        }

        Ok(())
    }

    /// Names of provider credentials that are still empty
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.provider.client_id.is_empty() {
            missing.push("client_id");
        }
        if self.provider.client_secret.is_empty() {
            missing.push("client_secret");
        }
        if self.provider.redirect_uri.is_empty() {
            missing.push("redirect_uri");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_toml_config() {
        let config_content = r#"
post_login_redirect_target = "http://localhost:5173"

[server]
port = 8080
public_dir = "static"

[provider]
client_id = "abc"
client_secret = "shh"
redirect_uri = "http://localhost:8080/callback"
playlist_id = "xyz"
refresh_policy = "when_expiring"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.public_dir, "static");
        assert_eq!(config.provider.client_id, "abc");
        assert_eq!(config.provider.playlist_id, "xyz");
        assert_eq!(config.provider.refresh_policy, RefreshPolicy::WhenExpiring);
        assert_eq!(config.provider.token_url, "https://accounts.spotify.com/api/token");
        assert_eq!(config.post_login_redirect_target, "http://localhost:5173");
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.post_login_redirect_target, "/");
        assert_eq!(config.provider.refresh_policy, RefreshPolicy::Always);
        assert_eq!(
            config.provider.scopes.join(" "),
            "user-read-playback-state user-modify-playback-state streaming"
        );
        assert_eq!(
            config.missing_credentials(),
            vec!["client_id", "client_secret", "redirect_uri"]
        );
    }

    #[test]
    fn test_unresolved_env_reference_is_an_error() {
        let mut config = AppConfig::default();
        config.provider.client_secret = "$PLAYLIST_RELAY_TEST_UNSET_VARIABLE".to_string();

        let err = config.resolve_env_vars().unwrap_err();
        assert!(err.to_string().contains("PLAYLIST_RELAY_TEST_UNSET_VARIABLE"));
    }
}
