use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::ExtractionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    MalformedImage(String),
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::MalformedImage(_) => Self::MalformedImage(err.to_string()),
            ExtractionError::Service(message) => Self::Unexpected(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => {
                warn!(%message, "rejected request");
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            Self::MalformedImage(message) => {
                warn!(%message, "rejected upload");
                (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
            }
            Self::Unexpected(message) => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
