use thiserror::Error;

/// Resource API errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Provider API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}
