use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};

use comply_core::error::error_body;

/// Auth service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is locked")]
    AccountLocked { until: DateTime<Utc> },
    #[error("invalid token")]
    InvalidToken,
    #[error("MFA is not set up")]
    MfaNotSetUp,
    #[error("invalid MFA code")]
    InvalidMfaCode,
    #[error("user not found")]
    UserNotFound,
    #[error("user with this email already exists")]
    EmailTaken,
    #[error("{0}")]
    InsufficientPermissions(String),
    #[error("tenant context not found")]
    TenantContextMissing,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::MfaNotSetUp => "MFA_NOT_SET_UP",
            Self::InvalidMfaCode => "INVALID_MFA_CODE",
            Self::UserNotFound => "NOT_FOUND",
            Self::EmailTaken => "CONFLICT",
            Self::InsufficientPermissions(_) => "INSUFFICIENT_PERMISSIONS",
            Self::TenantContextMissing => "TENANT_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::MfaNotSetUp | Self::TenantContextMissing => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials
            | Self::AccountLocked { .. }
            | Self::InvalidToken
            | Self::InvalidMfaCode => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        // 4xx are expected client errors and already visible in the access log.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, code = self.code(), "internal error");
        }
        let details = match &self {
            Self::AccountLocked { until } => Some(serde_json::json!({
                "locked_until": until.to_rfc3339_opts(SecondsFormat::Secs, true),
            })),
            _ => None,
        };
        let body = error_body(self.code(), &self.to_string(), details);
        (self.status(), axum::Json(body)).into_response()
    }
}
