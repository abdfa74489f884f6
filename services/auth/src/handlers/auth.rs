use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use comply_auth_types::identity::TenantHeader;

use crate::error::AuthServiceError;
use crate::handlers::{MessageResponse, UserResponse};
use crate::state::AppState;
use crate::usecase::account::{RegisterInput, RegisterUseCase, VerifyEmailUseCase};
use crate::usecase::token::{
    AuthTokens, LoginInput, LoginOutcome, LoginUseCase, LogoutUseCase, MfaLoginInput,
    MfaLoginUseCase, RefreshTokenUseCase,
};

const TOKEN_TYPE: &str = "Bearer";

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserResponse,
}

impl From<AuthTokens> for AuthResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: TOKEN_TYPE,
            expires_in: tokens.expires_in,
            user: tokens.user.into(),
        }
    }
}

#[derive(Serialize)]
pub struct MfaChallengeResponse {
    pub mfa_required: bool,
    pub mfa_token: String,
    pub expires_in: u64,
}

// ── POST /api/v1/auth/register ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub message: &'static str,
}

pub async fn register(
    State(state): State<AppState>,
    TenantHeader(tenant_id): TenantHeader,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        tokens: state.token_store(),
    };

    let user = usecase
        .execute(RegisterInput {
            tenant_id,
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user.into(),
            message: "Registration successful. Please check your email to verify your account.",
        }),
    ))
}

// ── POST /api/v1/auth/login ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    TenantHeader(tenant_id): TenantHeader,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        tokens: state.token_store(),
        jwt_secret: state.jwt_secret.clone(),
        policy: state.lockout,
    };

    let outcome = usecase
        .execute(LoginInput {
            tenant_id,
            email: body.email,
            password: body.password,
        })
        .await?;

    let response = match outcome {
        LoginOutcome::Authenticated(tokens) => Json(AuthResponse::from(tokens)).into_response(),
        LoginOutcome::MfaRequired {
            mfa_token,
            expires_in,
        } => Json(MfaChallengeResponse {
            mfa_required: true,
            mfa_token,
            expires_in,
        })
        .into_response(),
    };
    Ok(response)
}

// ── POST /api/v1/auth/mfa/login ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MfaLoginRequest {
    pub mfa_token: String,
    pub code: String,
}

pub async fn mfa_login(
    State(state): State<AppState>,
    Json(body): Json<MfaLoginRequest>,
) -> Result<Json<AuthResponse>, AuthServiceError> {
    let usecase = MfaLoginUseCase {
        users: state.user_repo(),
        tokens: state.token_store(),
        jwt_secret: state.jwt_secret.clone(),
        policy: state.lockout,
    };

    let tokens = usecase
        .execute(MfaLoginInput {
            mfa_token: body.mfa_token,
            code: body.code,
        })
        .await?;
    Ok(Json(tokens.into()))
}

// ── POST /api/v1/auth/refresh ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, AuthServiceError> {
    let usecase = RefreshTokenUseCase {
        users: state.user_repo(),
        tokens: state.token_store(),
        jwt_secret: state.jwt_secret.clone(),
    };

    let tokens = usecase.execute(&body.refresh_token).await?;
    Ok(Json(tokens.into()))
}

// ── POST /api/v1/auth/logout ─────────────────────────────────────────────────

pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<MessageResponse>, AuthServiceError> {
    let usecase = LogoutUseCase {
        tokens: state.token_store(),
    };

    usecase.execute(&body.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully",
    }))
}

// ── POST /api/v1/auth/verify-email ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

pub async fn verify_email(
    State(state): State<AppState>,
    TenantHeader(tenant_id): TenantHeader,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AuthServiceError> {
    let usecase = VerifyEmailUseCase {
        users: state.user_repo(),
        tokens: state.token_store(),
    };

    usecase.execute(tenant_id, &body.token).await?;
    Ok(Json(MessageResponse {
        message: "Email verified successfully",
    }))
}
