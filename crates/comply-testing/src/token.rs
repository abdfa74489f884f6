//! Signed JWT fixtures.
//!
//! Claims are built as raw JSON so tests can also produce tokens the auth service never
//! would (expired, foreign `type`, unknown roles).

use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration-tests";

pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Sign arbitrary claims with [`TEST_JWT_SECRET`].
pub fn sign(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// A valid 15-minute access token.
pub fn access_token(user_id: UserId, tenant_id: Option<TenantId>, roles: &[Role]) -> String {
    let now = now_secs();
    sign(&json!({
        "sub": user_id.to_string(),
        "tenant_id": tenant_id.map(|t| t.to_string()).unwrap_or_default(),
        "email": "user@example.test",
        "roles": roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "iat": now,
        "exp": now + 900,
    }))
}

/// An access token that expired an hour ago.
pub fn expired_access_token(user_id: UserId, tenant_id: Option<TenantId>) -> String {
    let now = now_secs();
    sign(&json!({
        "sub": user_id.to_string(),
        "tenant_id": tenant_id.map(|t| t.to_string()).unwrap_or_default(),
        "roles": ["client"],
        "iat": now - 7200,
        "exp": now - 3600,
    }))
}

/// A valid refresh token. Its presence in a token store is up to the test.
pub fn refresh_token(user_id: UserId, tenant_id: Option<TenantId>) -> String {
    let now = now_secs();
    sign(&json!({
        "sub": user_id.to_string(),
        "tenant_id": tenant_id.map(|t| t.to_string()).unwrap_or_default(),
        "type": "refresh",
        "iat": now,
        "exp": now + 7 * 24 * 3600,
    }))
}
