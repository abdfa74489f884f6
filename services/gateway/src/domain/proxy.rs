//! Pure forwarding rules: header filtering and target URL construction.

use std::collections::HashMap;

use axum::http::{HeaderMap, Method, StatusCode, header};
use bytes::Bytes;

use comply_auth_types::identity::{X_TENANT_ID, X_TENANT_SCHEMA, X_USER_ID, X_USER_ROLES};

/// Connection-scoped headers that never cross the proxy in either direction.
pub const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Identity headers only the gateway may set.
pub const TRUST_HEADERS: [&str; 4] = [X_USER_ID, X_USER_ROLES, X_TENANT_ID, X_TENANT_SCHEMA];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Client headers safe to send upstream. Drops hop-by-hop headers, `host`, and any
/// client-supplied trust header.
pub fn request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        let name_str = name.as_str();
        if is_hop_by_hop(name_str) || *name == header::HOST || TRUST_HEADERS.contains(&name_str) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Upstream headers returned to the client.
pub fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !is_hop_by_hop(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Fill `{name}` and `{*name}` segments of `template` from `params`. Unknown names are
/// left as written.
pub fn render_path(template: &str, params: &HashMap<String, String>) -> String {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let end = start + len;
        path.push_str(&rest[..start]);
        let name = rest[start + 1..end].trim_start_matches('*');
        match params.get(name) {
            Some(value) => path.push_str(value),
            None => path.push_str(&rest[start..=end]),
        }
        rest = &rest[end + 1..];
    }
    path.push_str(rest);
    path
}

/// `base` + `path` + `?query`, without doubling the slash between base and path.
pub fn build_target_url(base: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// A request ready to leave the gateway.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What a downstream service answered, hop-by-hop headers included.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}
