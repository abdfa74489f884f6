use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use comply_core::health::HasDatabase;

use crate::domain::lockout::LockoutPolicy;
use crate::infra::cache::RedisTokenStore;
use crate::infra::db::DbUserRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub jwt_secret: String,
    pub lockout: LockoutPolicy,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn token_store(&self) -> RedisTokenStore {
        RedisTokenStore {
            pool: self.redis.clone(),
        }
    }
}

impl HasDatabase for AppState {
    fn database(&self) -> &DatabaseConnection {
        &self.db
    }
}
