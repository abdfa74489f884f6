use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use comply_auth_types::identity::IdentityHeaders;
use comply_domain::user::MfaMethod;

use crate::error::AuthServiceError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::mfa::{SetupMfaUseCase, VerifyMfaUseCase};

// ── POST /api/v1/auth/mfa/setup ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetupMfaRequest {
    pub method: String,
}

#[derive(Serialize)]
pub struct SetupMfaResponse {
    pub qr_code_url: String,
    pub secret: String,
    pub message: &'static str,
}

pub async fn setup(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Json(body): Json<SetupMfaRequest>,
) -> Result<Json<SetupMfaResponse>, AuthServiceError> {
    let method: MfaMethod = body
        .method
        .parse()
        .map_err(|_| {
            AuthServiceError::InvalidInput(format!("unsupported MFA method: {}", body.method))
        })?;
    let scope = identity
        .scope()
        .ok_or(AuthServiceError::TenantContextMissing)?;

    let usecase = SetupMfaUseCase {
        users: state.user_repo(),
    };
    let enrollment = usecase.execute(&scope, identity.user_id, method).await?;

    Ok(Json(SetupMfaResponse {
        qr_code_url: enrollment.otpauth_url,
        secret: enrollment.secret,
        message: "Scan the QR code with your authenticator app, then verify a code to enable MFA",
    }))
}

// ── POST /api/v1/auth/mfa/verify ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyMfaRequest {
    pub code: String,
}

pub async fn verify(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Json(body): Json<VerifyMfaRequest>,
) -> Result<Json<MessageResponse>, AuthServiceError> {
    let scope = identity
        .scope()
        .ok_or(AuthServiceError::TenantContextMissing)?;

    let usecase = VerifyMfaUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&scope, identity.user_id, &body.code).await?;

    Ok(Json(MessageResponse {
        message: "MFA enabled successfully",
    }))
}
