use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Rejection details attached to [`AppError::RateLimitExceeded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDetails {
    pub limit: u64,
    pub remaining: u64,
    /// Unix seconds at which the current window resets.
    pub reset_at: i64,
    #[serde(skip)]
    pub retry_after_secs: u64,
}

/// Shared error taxonomy for the request pipeline.
///
/// Serialized as `{"code", "message", "details"?}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    InsufficientPermissions(String),
    #[error("tenant not found")]
    TenantNotFound,
    #[error("tenant context not found")]
    TenantContextMissing,
    #[error("tenant account is suspended or inactive")]
    TenantSuspended,
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("rate limit exceeded")]
    RateLimitExceeded(RateLimitDetails),
    #[error("upstream service is unavailable")]
    BadGateway,
    #[error("failed to proxy request")]
    Proxy(#[source] anyhow::Error),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::InsufficientPermissions(_) => "INSUFFICIENT_PERMISSIONS",
            Self::TenantNotFound | Self::TenantContextMissing => "TENANT_NOT_FOUND",
            Self::TenantSuspended => "TENANT_SUSPENDED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            Self::BadGateway => "SERVICE_UNAVAILABLE",
            Self::Proxy(_) => "PROXY_ERROR",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::TenantContextMissing => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden | Self::InsufficientPermissions(_) | Self::TenantSuspended => {
                StatusCode::FORBIDDEN
            }
            Self::NotFound | Self::TenantNotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
            Self::Proxy(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Build the JSON error body used by every service.
pub fn error_body(code: &str, message: &str, details: Option<serde_json::Value>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "code": code,
        "message": message,
    });
    if let Some(details) = details {
        body["details"] = details;
    }
    body
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client errors; the trace layer already records their status.
        match &self {
            Self::Internal(e) | Self::Proxy(e) => {
                tracing::error!(error = %e, code = self.code(), "internal error");
            }
            Self::BadGateway => tracing::warn!(code = self.code(), "upstream unavailable"),
            _ => {}
        }
        let details = match &self {
            Self::RateLimitExceeded(d) => serde_json::to_value(d).ok(),
            _ => None,
        };
        let body = error_body(self.code(), &self.to_string(), details);
        let mut response = (status, axum::Json(body)).into_response();

        if let Self::RateLimitExceeded(d) = &self {
            let headers = response.headers_mut();
            headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(d.limit));
            headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u64));
            headers.insert(X_RATELIMIT_RESET, HeaderValue::from(d.reset_at));
            headers.insert(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(d.retry_after_secs),
            );
        }
        response
    }
}
