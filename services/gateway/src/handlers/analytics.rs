use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{Value, json};

use comply_auth_types::authorize::Requirement;
use comply_core::error::AppError;

use crate::domain::route::RoutePolicy;
use crate::state::AppState;
use crate::usecase::gate::{Admission, GateRequest};

fn with_rate_headers(admission: &Admission, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(rate) = &admission.rate {
        rate.apply(response.headers_mut());
    }
    response
}

/// `GET /api/v1/analytics/stats`: live connection counts visible to the caller.
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let admission = state
        .gate()
        .admit(&GateRequest::from_headers(&headers), &RoutePolicy::authenticated())
        .await?;

    let stats = state
        .hub
        .stats(admission.scope())
        .await
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("hub stopped")))?;
    Ok(with_rate_headers(&admission, Json(stats)))
}

/// `POST /api/v1/analytics/events`: push a JSON event to every live client in the
/// caller's scope. Admins only.
pub async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Result<Response, AppError> {
    let policy = RoutePolicy::authenticated().require(Requirement::Level(2));
    let admission = state
        .gate()
        .admit(&GateRequest::from_headers(&headers), &policy)
        .await?;

    let payload = json!({
        "type": "event",
        "timestamp": Utc::now().timestamp(),
        "data": data,
    });
    state
        .hub
        .broadcast(admission.scope(), payload.to_string())
        .await;
    tracing::debug!(tenant_id = ?admission.scope().tenant_id(), "analytics event published");
    Ok(with_rate_headers(&admission, StatusCode::ACCEPTED))
}
