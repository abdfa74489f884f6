use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt as _;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::{DefaultOnRequest, HttpMakeClassifier, MakeSpan, OnResponse, TraceLayer};
use tracing::Span;
use uuid::Uuid;

use crate::error::error_body;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Requests slower than this are logged at warn level.
pub const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(1);

// ── Request id ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// Keep an incoming `X-Request-ID`, otherwise generate a UUID v4.
/// Apply with `.layer(request_id_layer())` outside every other layer.
pub fn request_id_layer() -> SetRequestIdLayer<MakeUuidRequestId> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeUuidRequestId)
}

/// Echo the request id on the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

// ── Access log ───────────────────────────────────────────────────────────────

/// Span carrying the fields of the access log. `tenant_id` is recorded once resolved.
#[derive(Clone, Debug, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request_id(request.headers()).unwrap_or("-");
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
            tenant_id = tracing::field::Empty,
        )
    }
}

#[derive(Clone, Debug)]
pub struct LogResponse {
    pub slow_threshold: Duration,
}

impl Default for LogResponse {
    fn default() -> Self {
        Self {
            slow_threshold: SLOW_REQUEST_THRESHOLD,
        }
    }
}

impl<B> OnResponse<B> for LogResponse {
    fn on_response(self, response: &axum::http::Response<B>, latency: Duration, _span: &Span) {
        let status = response.status().as_u16();
        let latency_ms = latency.as_millis() as u64;
        if latency >= self.slow_threshold {
            tracing::warn!(status, latency_ms, "slow request");
        } else {
            tracing::info!(status, latency_ms, "request completed");
        }
    }
}

pub fn trace_layer() -> TraceLayer<HttpMakeClassifier, RequestSpan, DefaultOnRequest, LogResponse> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(LogResponse::default())
}

/// Attach the resolved tenant to the current request span.
pub fn record_tenant(tenant_id: &dyn std::fmt::Display) {
    Span::current().record("tenant_id", tracing::field::display(tenant_id));
}

// ── Panic recovery ───────────────────────────────────────────────────────────

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Outermost handler guard: a panic becomes a generic 500 carrying only the request id.
///
/// Apply with `.layer(axum::middleware::from_fn(catch_panic))` inside the request-id layer.
pub async fn catch_panic(request: Request, next: Next) -> Response {
    let request_id = request_id(request.headers()).unwrap_or_default().to_owned();
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            tracing::error!(
                request_id = %request_id,
                panic = %panic_message(panic.as_ref()),
                "recovered from panic"
            );
            let body = error_body(
                "INTERNAL_SERVER_ERROR",
                "An unexpected error occurred",
                Some(serde_json::json!({ "request_id": request_id })),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
        }
    }
}

/// Stack shared by every service, outermost first: request id, access log,
/// response request id, panic guard.
pub fn with_common_layers<S>(router: axum::Router<S>) -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(axum::middleware::from_fn(catch_panic))
        .layer(propagate_request_id_layer())
        .layer(trace_layer())
        .layer(request_id_layer())
}
