pub mod oauth;
pub mod token_store;

pub use oauth::{AuthError, OAuthClient, OAuthConfig, RefreshOutcome, TokenGrant};
pub use token_store::{CredentialStore, Credentials};
