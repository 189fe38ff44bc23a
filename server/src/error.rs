use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::upstream::UpstreamError;

/// Errors surfaced to API clients. Every variant maps to a stable string
/// code and an HTTP status.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{service} did not respond in time")]
    UpstreamTimeout { service: &'static str },
    #[error("{service} is temporarily unavailable ({detail})")]
    UpstreamError { service: &'static str, detail: String },
    #[error("{service} returned an unexpected response")]
    UpstreamMalformed { service: &'static str },
    #[error("{0}")]
    NotFound(String),
    #[error("{service} rate limit exceeded")]
    RateLimited { service: &'static str },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::UpstreamTimeout { .. } => "upstream_timeout",
            ApiError::UpstreamError { .. } => "upstream_error",
            ApiError::UpstreamMalformed { .. } => "upstream_malformed",
            ApiError::NotFound(_) => "not_found",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::UpstreamError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::UpstreamMalformed { .. } => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Timeout { service } => ApiError::UpstreamTimeout { service },
            UpstreamError::RateLimited { service } => ApiError::RateLimited { service },
            UpstreamError::Status { service, status } => ApiError::UpstreamError {
                service,
                detail: format!("HTTP {}", status),
            },
            UpstreamError::Transport { service, .. } => ApiError::UpstreamError {
                service,
                detail: "connection failed".to_string(),
            },
            UpstreamError::Malformed { service, detail } => {
                tracing::warn!(service, %detail, "upstream response could not be decoded");
                ApiError::UpstreamMalformed { service }
            }
            UpstreamError::NotFound { what, .. } => ApiError::NotFound(what),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub status: String,
    pub error: ErrorDetail,
    pub timestamp: String,
}

impl ErrorBody {
    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status: "error".to_string(),
            error: ErrorDetail {
                code: err.code().to_string(),
                message: err.to_string(),
            },
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(code = self.code(), "{}", self);
        } else {
            tracing::debug!(code = self.code(), "{}", self);
        }
        (status, Json(ErrorBody::from_error(&self))).into_response()
    }
}
