use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use bytes::Bytes;

use comply_auth_types::identity::{
    X_TENANT_ID, X_TENANT_SCHEMA, X_USER_ID, X_USER_ROLES, roles_header_value,
};
use comply_core::error::AppError;

use crate::domain::proxy::{
    OutboundRequest, UpstreamResponse, build_target_url, render_path, request_headers,
    response_headers,
};
use crate::domain::repository::Forwarder;
use crate::domain::route::{ProxyRoute, Target, Upstreams};
use crate::usecase::gate::Admission;

/// A client request as received by the gateway.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Matched path parameters.
    pub params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(value).map_err(|e| AppError::Proxy(e.into()))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// Set the identity headers downstream services trust. `X-Request-ID` is carried over
/// from the inbound request, which the request-id layer always populates.
pub fn apply_trust_headers(admission: &Admission, headers: &mut HeaderMap) -> Result<(), AppError> {
    if let Some(tenant) = &admission.resolution.tenant {
        insert(headers, X_TENANT_ID, &tenant.id.to_string())?;
        insert(headers, X_TENANT_SCHEMA, &tenant.schema_name())?;
    }
    if let Some(identity) = &admission.identity {
        insert(headers, X_USER_ID, &identity.user_id.to_string())?;
        insert(headers, X_USER_ROLES, &roles_header_value(&identity.roles))?;
    }
    Ok(())
}

pub struct ForwardUseCase<F: Forwarder> {
    pub forwarder: F,
    pub upstreams: Arc<Upstreams>,
}

impl<F: Forwarder> ForwardUseCase<F> {
    pub async fn execute(
        &self,
        route: &ProxyRoute,
        admission: &Admission,
        inbound: InboundRequest,
    ) -> Result<UpstreamResponse, AppError> {
        let path = match route.target {
            Target::SamePath => inbound.path,
            Target::Rewrite(template) => render_path(template, &inbound.params),
        };
        let url = build_target_url(
            self.upstreams.base_url(route.upstream),
            &path,
            inbound.query.as_deref(),
        );

        let mut headers = request_headers(&inbound.headers);
        apply_trust_headers(admission, &mut headers)?;

        let started = Instant::now();
        let response = self
            .forwarder
            .forward(OutboundRequest {
                method: inbound.method,
                url,
                headers,
                body: inbound.body,
            })
            .await?;
        tracing::debug!(
            upstream = route.upstream.as_str(),
            status = response.status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        Ok(UpstreamResponse {
            status: response.status,
            headers: response_headers(&response.headers),
            body: response.body,
        })
    }
}
