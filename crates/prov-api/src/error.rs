//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps store and chain errors to HTTP status codes with JSON bodies of
//! the form `{ "error": { code, message } }`. Internal detail is never
//! exposed to clients; chain-transaction failures are the exception —
//! their messages are the policy-defined caller-visible strings from
//! the failure taxonomy, so a caller never sees an opaque 500 for a
//! chain-only problem.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use prov_chain::FailureKind;
use prov_store::StoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found, or not visible to the caller (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or unusable identity claim (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller's role does not permit the operation (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A chain transaction failed on a path where failure surfaces
    /// (502). Carries the classified kind and the policy message.
    #[error("chain transaction failed ({kind:?}): {message}")]
    ChainTransaction {
        kind: FailureKind,
        message: String,
    },

    /// Chain integration is required but unavailable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ChainTransaction { .. } => (StatusCode::BAD_GATEWAY, "CHAIN_TX_FAILED"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients. Chain
        // failures carry policy messages and pass through.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::ChainTransaction { message, .. } => message.clone(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ChainTransaction { kind, .. } => {
                tracing::warn!(error = %self, kind = ?kind, "chain transaction error")
            }
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => {
                Self::NotFound("item does not exist or you do not have permission".to_string())
            }
            StoreError::InsufficientInventory { .. } => Self::Validation(err.to_string()),
            StoreError::Corrupt(_) | StoreError::Backend(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, body) = response_parts(AppError::NotFound("product 123".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "NOT_FOUND");
        assert!(body.error.message.contains("product 123"));
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            !body.error.message.contains("db connection"),
            "internal error details must not leak: {}",
            body.error.message
        );
    }

    #[tokio::test]
    async fn chain_failure_passes_policy_message_through() {
        let (status, body) = response_parts(AppError::ChainTransaction {
            kind: FailureKind::InsufficientFunds,
            message: "insufficient funds for blockchain transaction".into(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "CHAIN_TX_FAILED");
        assert!(body.error.message.contains("insufficient funds"));
    }

    #[tokio::test]
    async fn store_not_found_becomes_client_error() {
        let err: AppError = StoreError::NotFound {
            entity: "order",
            key: "o1".into(),
        }
        .into();
        let (status, _) = response_parts(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn insufficient_inventory_is_validation() {
        let err: AppError = StoreError::InsufficientInventory {
            available: 1,
            requested: 5,
        }
        .into();
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.error.message.contains("insufficient inventory"));
    }
}
