use axum::{
    Router,
    routing::{get, post},
};

use comply_core::health::{healthz, readyz};
use comply_core::middleware::with_common_layers;

use crate::handlers::{account, auth, mfa};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<AppState>))
        // Public, tenant selected by X-Tenant-ID
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/verify-email", post(auth::verify_email))
        // Token lifecycle
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/mfa/login", post(auth::mfa_login))
        // Authenticated, identity injected by the gateway
        .route("/api/v1/auth/me", get(account::me))
        .route("/api/v1/auth/mfa/setup", post(mfa::setup))
        .route("/api/v1/auth/mfa/verify", post(mfa::verify))
        .route("/api/v1/users/{id}/unlock", post(account::unlock))
        .with_state(state);

    with_common_layers(router)
}
