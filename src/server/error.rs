use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use thiserror::Error;

/// Request-scoped failures, translated to a status code at the handler boundary
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No code in callback")]
    MissingCode,

    #[error("{0}")]
    ProviderToken(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Code exchange never got a usable answer; answered as plain text
    #[error("Token exchange failed")]
    TokenExchangeFailed,

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Misconfigured(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCode | AppError::ProviderToken(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream { status, .. } => *status,
            AppError::TokenExchangeFailed
            | AppError::Transport(_)
            | AppError::Misconfigured(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AppError::TokenExchangeFailed = self {
            return (status, self.to_string()).into_response();
        }

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::MissingCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ProviderToken("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthenticated("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Upstream { status: StatusCode::NOT_FOUND, message: "x".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::TokenExchangeFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Transport("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
