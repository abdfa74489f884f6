use std::time::Duration;

use anyhow::Context as _;
use reqwest::Client;

use comply_core::error::AppError;

use crate::domain::proxy::{OutboundRequest, UpstreamResponse};
use crate::domain::repository::Forwarder;

/// Forwards over a shared reqwest client. Every call is bounded by the client timeout.
#[derive(Clone)]
pub struct HttpForwarder {
    pub client: Client,
}

impl HttpForwarder {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn send_error(url: &str, e: reqwest::Error) -> AppError {
    if e.is_builder() {
        return AppError::Proxy(anyhow::Error::new(e).context("build upstream request"));
    }
    tracing::warn!(url, timeout = e.is_timeout(), error = %e, "upstream unreachable");
    AppError::BadGateway
}

impl Forwarder for HttpForwarder {
    async fn forward(&self, request: OutboundRequest) -> Result<UpstreamResponse, AppError> {
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| send_error(&request.url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .context("read upstream body")
            .map_err(AppError::Proxy)?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
