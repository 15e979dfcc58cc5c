//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error body is JSON of the form `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use yupay_core::Decision;

use crate::db::RepositoryError;
use crate::services::SubscriptionError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Subscription operation failed.
    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Subscription(err) => match err {
                SubscriptionError::NotSubscribed => StatusCode::NOT_FOUND,
                SubscriptionError::AlreadySubscribed | SubscriptionError::Contended { .. } => {
                    StatusCode::CONFLICT
                }
                SubscriptionError::Denied(_) => StatusCode::PAYMENT_REQUIRED,
                SubscriptionError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn denial_message(decision: &Decision) -> String {
    decision
        .reason
        .map_or_else(|| "action not allowed".to_string(), |reason| reason.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Database(_) | Self::Subscription(SubscriptionError::Repository(_)) => {
                json!({ "error": "Internal server error" })
            }
            Self::Subscription(SubscriptionError::Denied(decision)) => json!({
                "error": denial_message(decision),
                "decision": decision,
            }),
            Self::Subscription(err) => json!({ "error": err.to_string() }),
            Self::BadRequest(_) => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
