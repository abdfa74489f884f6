use deadpool_redis::Pool;
use deadpool_redis::redis::{self, AsyncCommands, RedisError};

use comply_core::error::AppError;

use crate::domain::repository::CounterStore;

#[derive(Clone)]
pub struct RedisCounterStore {
    pub pool: Pool,
}

impl RedisCounterStore {
    async fn conn(&self) -> Result<deadpool_redis::Connection, AppError> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }
}

/// Redis reports -2 for a missing key and -1 for a key without expiry.
fn ttl_from_reply(reply: i64) -> Option<u64> {
    u64::try_from(reply).ok()
}

impl CounterStore for RedisCounterStore {
    async fn count(&self, key: &str) -> Result<u64, AppError> {
        let mut conn = self.conn().await?;
        let value: Option<u64> = conn
            .get(key)
            .await
            .map_err(|e: RedisError| AppError::Internal(e.into()))?;
        Ok(value.unwrap_or(0))
    }

    async fn ttl_secs(&self, key: &str) -> Result<Option<u64>, AppError> {
        let mut conn = self.conn().await?;
        let reply: i64 = conn
            .ttl(key)
            .await
            .map_err(|e: RedisError| AppError::Internal(e.into()))?;
        Ok(ttl_from_reply(reply))
    }

    async fn increment(&self, key: &str, expire_secs: Option<u64>) -> Result<u64, AppError> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic().incr(key, 1u64);
        if let Some(secs) = expire_secs {
            pipe.expire(key, secs as i64).ignore();
        }
        let (count,): (u64,) = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e: RedisError| AppError::Internal(e.into()))?;
        Ok(count)
    }

    async fn expire(&self, key: &str, secs: u64) -> Result<(), AppError> {
        let mut conn = self.conn().await?;
        let _: bool = conn
            .expire(key, secs as i64)
            .await
            .map_err(|e: RedisError| AppError::Internal(e.into()))?;
        Ok(())
    }
}
