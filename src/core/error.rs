//! Errori - Tassonomia degli errori del sottosistema di messaggistica e mapping HTTP

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

/// Errori di dominio restituiti dai componenti di `messaging`, dagli store e dallo storage
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("no authenticated identity")]
    NotAuthenticated,

    #[error("conversation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("media upload failed: {0}")]
    UploadFailed(String),

    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("message not found")]
    NotFound,
}

impl From<sqlx::Error> for MessagingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for MessagingError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Errore HTTP restituito dagli handler axum
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: &'static str,
    details: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    // Common error constructors
    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_server_error(message: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: &'static str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<MessagingError> for AppError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::NotAuthenticated => Self::unauthorized("Not authenticated"),
            MessagingError::StoreUnavailable(details) => {
                Self::service_unavailable("Conversation store unavailable").with_details(details)
            }
            MessagingError::UploadFailed(details) => {
                Self::new(StatusCode::BAD_GATEWAY, "Media upload failed").with_details(details)
            }
            MessagingError::PermissionDenied(reason) => {
                Self::forbidden("Permission denied").with_details(reason)
            }
            MessagingError::InvalidPayload(details) => {
                Self::bad_request("Invalid message").with_details(details)
            }
            MessagingError::NotFound => Self::not_found("Message not found"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        MessagingError::from(err).into()
    }
}

impl From<axum::Error> for AppError {
    fn from(err: axum::Error) -> Self {
        Self::internal_server_error("Internal server error").with_details(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::bad_request("Validation error").with_details(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorResponse {
            error: self.message,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}
