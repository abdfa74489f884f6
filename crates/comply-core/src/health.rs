use axum::extract::State;
use axum::http::StatusCode;
use sea_orm::DatabaseConnection;

/// State that owns a database connection readiness can probe.
pub trait HasDatabase: Clone + Send + Sync + 'static {
    fn database(&self) -> &DatabaseConnection;
}

/// `GET /healthz`: the process is up.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz`: the database answers a ping.
pub async fn readyz<S: HasDatabase>(State(state): State<S>) -> StatusCode {
    match state.database().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
