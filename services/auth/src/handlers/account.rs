use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use comply_auth_types::identity::IdentityHeaders;
use comply_domain::id::UserId;

use crate::error::AuthServiceError;
use crate::handlers::{MessageResponse, UserResponse};
use crate::state::AppState;
use crate::usecase::account::{GetProfileUseCase, UnlockUserUseCase};

// ── GET /api/v1/auth/me ──────────────────────────────────────────────────────

pub async fn me(
    State(state): State<AppState>,
    identity: IdentityHeaders,
) -> Result<Json<UserResponse>, AuthServiceError> {
    let usecase = GetProfileUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(&identity).await?;
    Ok(Json(user.into()))
}

// ── POST /api/v1/users/{id}/unlock ───────────────────────────────────────────

pub async fn unlock(
    State(state): State<AppState>,
    identity: IdentityHeaders,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AuthServiceError> {
    let usecase = UnlockUserUseCase {
        users: state.user_repo(),
        policy: state.lockout,
    };
    usecase.execute(&identity, UserId(user_id)).await?;
    Ok(Json(MessageResponse {
        message: "User unlocked successfully",
    }))
}
