use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::{MarketError, StoreError};

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }

        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        let message = match &err {
            // Forbidden carries a complete sentence already
            MarketError::Forbidden(reason) => reason.clone(),
            MarketError::Validation(reason) | MarketError::NotFound(reason) => reason.clone(),
            other => other.to_string(),
        };

        let status = match err {
            MarketError::NotListed(_) | MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketError::AlreadyListed(_) | MarketError::Conflict(_) => StatusCode::CONFLICT,
            MarketError::Forbidden(_) => StatusCode::FORBIDDEN,
            MarketError::SelfPurchase
            | MarketError::InsufficientFunds { .. }
            | MarketError::NoTeamForActor(_)
            | MarketError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self::new(status, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        MarketError::from(err).into()
    }
}
