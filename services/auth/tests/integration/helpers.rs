#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use comply_auth::domain::lockout::{LockoutPolicy, LockoutState};
use comply_auth::domain::repository::{TokenStore, UserRepository};
use comply_auth::domain::types::{AuthUser, NewUser};
use comply_auth::error::AuthServiceError;
use comply_auth::infra::password::hash_password;
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;
use comply_domain::scope::TenantScope;
use comply_domain::user::{MfaMethod, UserStatus};

pub use comply_testing::token::TEST_JWT_SECRET;

pub const TEST_PASSWORD: &str = "correct horse battery";

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<AuthUser>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<AuthUser>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a shared handle to the user list for post-execution inspection.
    pub fn users_handle(&self) -> Arc<Mutex<Vec<AuthUser>>> {
        Arc::clone(&self.users)
    }

    fn update<F: FnOnce(&mut AuthUser)>(&self, scope: &TenantScope, id: UserId, f: F) -> bool {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.id == id && visible(scope, u))
        {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        }
    }
}

fn visible(scope: &TenantScope, user: &AuthUser) -> bool {
    match scope {
        TenantScope::Tenant(id) => user.tenant_id == Some(*id),
        TenantScope::Global => true,
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_email(
        &self,
        scope: &TenantScope,
        email: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email && visible(scope, u))
            .cloned())
    }

    async fn find_by_id(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id && visible(scope, u))
            .cloned())
    }

    async fn create(&self, new: &NewUser) -> Result<AuthUser, AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.tenant_id == Some(new.tenant_id) && u.email == new.email)
        {
            return Err(AuthServiceError::EmailTaken);
        }
        let user = AuthUser {
            id: new.id,
            tenant_id: Some(new.tenant_id),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            status: UserStatus::Active,
            email_verified: false,
            mfa_enabled: false,
            mfa_method: None,
            mfa_secret: None,
            lockout: LockoutState::default(),
            last_login_at: None,
            roles: new.roles.clone(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn save_lockout(
        &self,
        scope: &TenantScope,
        id: UserId,
        state: &LockoutState,
    ) -> Result<bool, AuthServiceError> {
        Ok(self.update(scope, id, |u| u.lockout = *state))
    }

    async fn record_login(
        &self,
        scope: &TenantScope,
        id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        self.update(scope, id, |u| {
            u.lockout = LockoutState::default();
            u.last_login_at = Some(at);
        });
        Ok(())
    }

    async fn set_mfa_secret(
        &self,
        scope: &TenantScope,
        id: UserId,
        method: MfaMethod,
        secret: &str,
    ) -> Result<(), AuthServiceError> {
        self.update(scope, id, |u| {
            u.mfa_method = Some(method);
            u.mfa_secret = Some(secret.to_owned());
        });
        Ok(())
    }

    async fn enable_mfa(&self, scope: &TenantScope, id: UserId) -> Result<(), AuthServiceError> {
        self.update(scope, id, |u| u.mfa_enabled = true);
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        scope: &TenantScope,
        id: UserId,
        _at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        Ok(self.update(scope, id, |u| u.email_verified = true))
    }
}

// ── MockTokenStore ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockTokenStore {
    pub refresh: Arc<Mutex<HashMap<String, UserId>>>,
    pub verification: Arc<Mutex<HashMap<String, UserId>>>,
    /// Every call fails as if Redis were down.
    pub unavailable: bool,
}

impl MockTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn refresh_handle(&self) -> Arc<Mutex<HashMap<String, UserId>>> {
        Arc::clone(&self.refresh)
    }

    pub fn verification_handle(&self) -> Arc<Mutex<HashMap<String, UserId>>> {
        Arc::clone(&self.verification)
    }

    fn check(&self) -> Result<(), AuthServiceError> {
        if self.unavailable {
            Err(AuthServiceError::Internal(anyhow::anyhow!("connection refused")))
        } else {
            Ok(())
        }
    }
}

impl TokenStore for MockTokenStore {
    async fn store_refresh_token(
        &self,
        token: &str,
        user_id: UserId,
        _ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        self.check()?;
        self.refresh.lock().unwrap().insert(token.to_owned(), user_id);
        Ok(())
    }

    async fn refresh_token_owner(&self, token: &str) -> Result<Option<UserId>, AuthServiceError> {
        self.check()?;
        Ok(self.refresh.lock().unwrap().get(token).copied())
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), AuthServiceError> {
        self.check()?;
        self.refresh.lock().unwrap().remove(token);
        Ok(())
    }

    async fn store_email_verification(
        &self,
        token: &str,
        user_id: UserId,
        _ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        self.check()?;
        self.verification
            .lock()
            .unwrap()
            .insert(token.to_owned(), user_id);
        Ok(())
    }

    async fn take_email_verification(
        &self,
        token: &str,
    ) -> Result<Option<UserId>, AuthServiceError> {
        self.check()?;
        Ok(self.verification.lock().unwrap().remove(token))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn test_tenant() -> TenantId {
    TenantId(Uuid::new_v4())
}

pub fn test_user(tenant_id: TenantId, roles: Vec<Role>) -> AuthUser {
    AuthUser {
        id: UserId(Uuid::new_v4()),
        tenant_id: Some(tenant_id),
        email: "agent@acme.test".to_owned(),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        status: UserStatus::Active,
        email_verified: true,
        mfa_enabled: false,
        mfa_method: None,
        mfa_secret: None,
        lockout: LockoutState::default(),
        last_login_at: None,
        roles,
        created_at: Utc::now(),
    }
}

pub fn system_admin() -> AuthUser {
    AuthUser {
        tenant_id: None,
        email: "root@comply.test".to_owned(),
        ..test_user(test_tenant(), vec![Role::SystemAdmin])
    }
}

pub fn policy() -> LockoutPolicy {
    LockoutPolicy::default()
}
