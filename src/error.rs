// =============================================================================
// ERROR MODULE
// =============================================================================
// Custom error type and its HTTP response mapping.
//
// Listing routes never surface these: they catch upstream failures and fall
// back to sample data. The passthrough routes and the lookup route return
// them directly.
// =============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
#[derive(Debug, Error)]
pub enum AppError {
    // -------------------------------------------------------------------------
    // UPSTREAM ERRORS
    // -------------------------------------------------------------------------
    /// No upstream base URL is configured
    #[error("Upstream stock API is not configured")]
    NotConfigured,

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    /// Network or TLS failure talking to the upstream
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),

    /// Upstream body could not be read as the expected shape
    #[error("Upstream response malformed: {0}")]
    UpstreamMalformed(String),

    /// Any upstream failure, folded into a plain gateway error
    #[error("Bad gateway: {0}")]
    Gateway(String),

    // -------------------------------------------------------------------------
    // REQUEST ERRORS
    // -------------------------------------------------------------------------
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

impl AppError {
    /// Collapses upstream failures into `Gateway` (502) so callers never see
    /// the upstream's own status. `NotConfigured` and non-upstream errors
    /// pass through unchanged.
    pub fn into_gateway(self) -> AppError {
        match self {
            AppError::UpstreamStatus { .. }
            | AppError::UpstreamUnavailable(_)
            | AppError::UpstreamMalformed(_) => AppError::Gateway(self.to_string()),
            other => other,
        }
    }
}

// =============================================================================
// HTTP RESPONSE CONVERSION
// =============================================================================
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, upstream_status) = match &self {
            AppError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED", None),

            // Surface the upstream's status code as-is
            AppError::UpstreamStatus { status, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "UPSTREAM_ERROR",
                Some(*status),
            ),

            AppError::UpstreamUnavailable(err) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNAVAILABLE",
                err.status().map(|status| status.as_u16()),
            ),

            AppError::UpstreamMalformed(_) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_MALFORMED", None)
            }

            AppError::Gateway(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", None),

            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),

            AppError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER", None),
        };

        let message = self.to_string();
        tracing::error!(
            error_code = error_code,
            status = status.as_u16(),
            message = %message,
            "Request failed"
        );

        let body = ErrorResponse::new(error_code, message)
            .with_status(upstream_status.unwrap_or(status.as_u16()));

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
