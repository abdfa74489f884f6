use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use comply_core::health::HasDatabase;

use crate::domain::route::Upstreams;
use crate::hub::HubHandle;
use crate::infra::cache::RedisCounterStore;
use crate::infra::db::DbTenantLookup;
use crate::infra::proxy::HttpForwarder;
use crate::usecase::forward::ForwardUseCase;
use crate::usecase::gate::Gate;
use crate::usecase::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::usecase::tenant::TenantResolver;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub forwarder: HttpForwarder,
    pub jwt_secret: String,
    pub rate_limit: RateLimitPolicy,
    pub upstreams: Arc<Upstreams>,
    pub hub: HubHandle,
}

impl AppState {
    pub fn tenant_lookup(&self) -> DbTenantLookup {
        DbTenantLookup {
            db: self.db.clone(),
        }
    }

    pub fn counter_store(&self) -> RedisCounterStore {
        RedisCounterStore {
            pool: self.redis.clone(),
        }
    }

    pub fn gate(&self) -> Gate<DbTenantLookup, RedisCounterStore> {
        Gate {
            resolver: TenantResolver {
                lookup: self.tenant_lookup(),
            },
            limiter: RateLimiter {
                store: self.counter_store(),
                policy: self.rate_limit,
            },
            jwt_secret: self.jwt_secret.clone(),
        }
    }

    pub fn forward(&self) -> ForwardUseCase<HttpForwarder> {
        ForwardUseCase {
            forwarder: self.forwarder.clone(),
            upstreams: self.upstreams.clone(),
        }
    }
}

impl HasDatabase for AppState {
    fn database(&self) -> &DatabaseConnection {
        &self.db
    }
}
