use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors surfaced to HTTP callers.
///
/// Bodies are short plain-text messages. Variants wrapping an
/// [`anyhow::Error`] respond with a fixed message and keep the detail in logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Failed to read request body: {0}")]
    BodyRead(anyhow::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BodyRead(_)
            | AppError::Upstream(_)
            | AppError::InternalError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message written to the response body.
    pub fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::Forbidden(msg) | AppError::Upstream(msg) => {
                msg.clone()
            }
            AppError::BodyRead(_) => "Failed to read request body".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
            AppError::ConfigError(_) => "Configuration error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::BodyRead(err) | AppError::InternalError(err) | AppError::ConfigError(err) => {
                tracing::error!(error = %format!("{:#}", err), status = %status, "Request failed");
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, status = %status, "Upstream call failed");
            }
            AppError::BadRequest(msg) | AppError::Forbidden(msg) => {
                tracing::warn!(reason = %msg, status = %status, "Request rejected");
            }
        }

        (status, self.public_message()).into_response()
    }
}
