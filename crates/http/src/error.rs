//! Error handling for the bookshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types that map to HTTP responses.
///
/// Converting one into a response does not write a body. It attaches an
/// [`ErrorReport`] that the envelope renderer layer turns into the uniform
/// error envelope, so the development flag stays in one place.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-range input; the message is shown verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Route not found")]
    RouteNotFound,

    /// An error that carries its own status code.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an error with an explicit status code
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::Status { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Debug chain of unexpected failures. Expected rejections carry none.
    fn stack(&self) -> Option<String> {
        match self {
            AppError::Internal(e) => Some(format!("{e:?}")),
            _ => None,
        }
    }
}

/// What the envelope renderer needs to describe a failed request.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub stack: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport {
            message: self.to_string(),
            stack: self.stack(),
        };

        let mut response = self.status().into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Fallback handler for requests no route matched.
pub async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}
