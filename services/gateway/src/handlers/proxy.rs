use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use bytes::Bytes;

use comply_core::error::AppError;

use crate::domain::proxy::UpstreamResponse;
use crate::domain::route::ProxyRoute;
use crate::state::AppState;
use crate::usecase::forward::InboundRequest;
use crate::usecase::gate::GateRequest;

/// Upstream answer as a client response. A body without `Content-Type` that parses as
/// JSON is labelled `application/json`; a labelled body keeps the upstream `Content-Type`.
pub fn into_client_response(upstream: UpstreamResponse) -> Response {
    let UpstreamResponse {
        status,
        mut headers,
        body,
    } = upstream;
    if !headers.contains_key(header::CONTENT_TYPE)
        && serde_json::from_slice::<serde_json::Value>(&body).is_ok()
    {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
    (status, headers, body).into_response()
}

/// Every table route: run the pipeline, then forward.
pub async fn forward(
    State(state): State<AppState>,
    Extension(route): Extension<Arc<ProxyRoute>>,
    Path(params): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let admission = state
        .gate()
        .admit(&GateRequest::from_headers(&headers), &route.policy)
        .await?;

    let inbound = InboundRequest {
        method,
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        params,
        headers,
        body,
    };
    let upstream = state.forward().execute(&route, &admission, inbound).await?;

    let mut response = into_client_response(upstream);
    if let Some(rate) = admission.rate {
        rate.apply(response.headers_mut());
    }
    Ok(response)
}
