use deadpool_redis::Pool;
use deadpool_redis::redis::{AsyncCommands, RedisError};

use comply_domain::id::UserId;

use crate::domain::repository::TokenStore;
use crate::error::AuthServiceError;

#[derive(Clone)]
pub struct RedisTokenStore {
    pub pool: Pool,
}

fn refresh_token_key(token: &str) -> String {
    format!("refresh_token:{}", token)
}

fn email_verification_key(token: &str) -> String {
    format!("email_verification:{}", token)
}

fn parse_owner(value: Option<String>) -> Option<UserId> {
    value.and_then(|v| v.parse().ok())
}

impl RedisTokenStore {
    async fn conn(&self) -> Result<deadpool_redis::Connection, AuthServiceError> {
        self.pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))
    }
}

impl TokenStore for RedisTokenStore {
    async fn store_refresh_token(
        &self,
        token: &str,
        user_id: UserId,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .set_ex(refresh_token_key(token), user_id.to_string(), ttl_secs)
            .await
            .map_err(|e: RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(())
    }

    async fn refresh_token_owner(&self, token: &str) -> Result<Option<UserId>, AuthServiceError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get(refresh_token_key(token))
            .await
            .map_err(|e: RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(parse_owner(value))
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let _: u64 = conn
            .del(refresh_token_key(token))
            .await
            .map_err(|e: RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(())
    }

    async fn store_email_verification(
        &self,
        token: &str,
        user_id: UserId,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let mut conn = self.conn().await?;
        let (): () = conn
            .set_ex(email_verification_key(token), user_id.to_string(), ttl_secs)
            .await
            .map_err(|e: RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(())
    }

    async fn take_email_verification(
        &self,
        token: &str,
    ) -> Result<Option<UserId>, AuthServiceError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn
            .get_del(email_verification_key(token))
            .await
            .map_err(|e: RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(parse_owner(value))
    }
}
