#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use uuid::Uuid;

use comply_auth_types::token::TokenInfo;
use comply_core::error::AppError;
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;
use comply_domain::tenant::Tenant;
use comply_gateway::domain::proxy::{OutboundRequest, UpstreamResponse};
use comply_gateway::domain::repository::{CounterStore, Forwarder, TenantLookup};
use comply_gateway::usecase::gate::Gate;
use comply_gateway::usecase::rate_limit::{RateLimitPolicy, RateLimiter};
use comply_gateway::usecase::tenant::TenantResolver;

pub use comply_testing::token::TEST_JWT_SECRET;

// ── MockTenantLookup ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockTenantLookup {
    pub tenants: Arc<Mutex<Vec<Tenant>>>,
}

impl MockTenantLookup {
    pub fn new(tenants: Vec<Tenant>) -> Self {
        Self {
            tenants: Arc::new(Mutex::new(tenants)),
        }
    }

    pub fn tenants_handle(&self) -> Arc<Mutex<Vec<Tenant>>> {
        Arc::clone(&self.tenants)
    }
}

impl TenantLookup for MockTenantLookup {
    async fn by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError> {
        let tenants = self.tenants.lock().unwrap();
        Ok(tenants.iter().find(|t| t.subdomain == subdomain).cloned())
    }

    async fn by_id(&self, id: TenantId) -> Result<Option<Tenant>, AppError> {
        let tenants = self.tenants.lock().unwrap();
        Ok(tenants.iter().find(|t| t.id == id).cloned())
    }
}

// ── MockCounterStore ─────────────────────────────────────────────────────────

/// Counter value and remaining TTL. Time never passes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub value: u64,
    pub ttl_secs: Option<u64>,
}

#[derive(Clone, Default)]
pub struct MockCounterStore {
    pub counters: Arc<Mutex<HashMap<String, Counter>>>,
    pub unavailable: bool,
}

impl MockCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails, as if Redis were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn counters_handle(&self) -> Arc<Mutex<HashMap<String, Counter>>> {
        Arc::clone(&self.counters)
    }

    fn check(&self) -> Result<(), AppError> {
        if self.unavailable {
            return Err(AppError::Internal(anyhow::anyhow!("redis connection refused")));
        }
        Ok(())
    }
}

impl CounterStore for MockCounterStore {
    async fn count(&self, key: &str) -> Result<u64, AppError> {
        self.check()?;
        let counters = self.counters.lock().unwrap();
        Ok(counters.get(key).map(|c| c.value).unwrap_or(0))
    }

    async fn ttl_secs(&self, key: &str) -> Result<Option<u64>, AppError> {
        self.check()?;
        let counters = self.counters.lock().unwrap();
        Ok(counters.get(key).and_then(|c| c.ttl_secs))
    }

    async fn increment(&self, key: &str, expire_secs: Option<u64>) -> Result<u64, AppError> {
        self.check()?;
        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry(key.to_owned()).or_insert(Counter {
            value: 0,
            ttl_secs: None,
        });
        counter.value += 1;
        if expire_secs.is_some() {
            counter.ttl_secs = expire_secs;
        }
        Ok(counter.value)
    }

    async fn expire(&self, key: &str, secs: u64) -> Result<(), AppError> {
        self.check()?;
        if let Some(counter) = self.counters.lock().unwrap().get_mut(key) {
            counter.ttl_secs = Some(secs);
        }
        Ok(())
    }
}

// ── MockForwarder ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Upstream {
    Respond(UpstreamResponse),
    Unreachable,
}

#[derive(Clone)]
pub struct MockForwarder {
    pub requests: Arc<Mutex<Vec<OutboundRequest>>>,
    pub upstream: Upstream,
}

impl MockForwarder {
    pub fn responding(response: UpstreamResponse) -> Self {
        Self {
            requests: Arc::default(),
            upstream: Upstream::Respond(response),
        }
    }

    pub fn ok_json(body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        Self::responding(UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(body.as_bytes()),
        })
    }

    pub fn unreachable() -> Self {
        Self {
            requests: Arc::default(),
            upstream: Upstream::Unreachable,
        }
    }

    pub fn requests_handle(&self) -> Arc<Mutex<Vec<OutboundRequest>>> {
        Arc::clone(&self.requests)
    }
}

impl Forwarder for MockForwarder {
    async fn forward(&self, request: OutboundRequest) -> Result<UpstreamResponse, AppError> {
        self.requests.lock().unwrap().push(request);
        match &self.upstream {
            Upstream::Respond(response) => Ok(response.clone()),
            Upstream::Unreachable => Err(AppError::BadGateway),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub const NOW: i64 = 1_700_000_000;

pub fn policy(limit: u64) -> RateLimitPolicy {
    RateLimitPolicy {
        limit,
        window_secs: 60,
    }
}

pub fn limiter(store: MockCounterStore, limit: u64) -> RateLimiter<MockCounterStore> {
    RateLimiter {
        store,
        policy: policy(limit),
    }
}

pub fn gate(
    lookup: MockTenantLookup,
    store: MockCounterStore,
    limit: u64,
) -> Gate<MockTenantLookup, MockCounterStore> {
    Gate {
        resolver: TenantResolver { lookup },
        limiter: limiter(store, limit),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    }
}

/// Identity as a validated access token would carry it.
pub fn identity(tenant_id: Option<TenantId>, roles: &[Role]) -> TokenInfo {
    TokenInfo {
        user_id: UserId(Uuid::new_v4()),
        tenant_id,
        email: Some("user@example.test".to_owned()),
        roles: roles.to_vec(),
        exp: u64::MAX,
    }
}
