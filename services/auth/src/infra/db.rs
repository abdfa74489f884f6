use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, SqlErr,
};
use uuid::Uuid;

use comply_auth_schema::{user_roles, users};
use comply_core::sea_ext::begin_scoped;
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::{Role, parse_roles};
use comply_domain::scope::TenantScope;
use comply_domain::user::{MfaMethod, UserStatus};

use crate::domain::lockout::LockoutState;
use crate::domain::repository::UserRepository;
use crate::domain::types::{AuthUser, NewUser};
use crate::error::AuthServiceError;

/// Row filter matching the scope. RLS enforces the same rule; this keeps queries
/// correct when the database role bypasses policies.
fn tenant_condition(scope: &TenantScope) -> Condition {
    match scope {
        TenantScope::Tenant(id) => Condition::all().add(users::Column::TenantId.eq(id.0)),
        TenantScope::Global => Condition::all(),
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn begin(&self, scope: &TenantScope) -> Result<DatabaseTransaction, AuthServiceError> {
        Ok(begin_scoped(&self.db, scope)
            .await
            .context("begin scoped transaction")?)
    }

    async fn find_one(
        &self,
        scope: &TenantScope,
        condition: Condition,
        what: &'static str,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        let txn = self.begin(scope).await?;
        let model = users::Entity::find()
            .filter(tenant_condition(scope))
            .filter(users::Column::DeletedAt.is_null())
            .filter(condition)
            .one(&txn)
            .await
            .context(what)?;
        let user = match model {
            Some(model) => {
                let roles = live_roles(&txn, model.id).await?;
                Some(user_from_model(model, roles)?)
            }
            None => None,
        };
        txn.commit().await.context("commit")?;
        Ok(user)
    }

    /// Update columns of one visible, non-deleted user. Returns whether a row matched.
    async fn update_user(
        &self,
        scope: &TenantScope,
        id: UserId,
        values: Vec<(users::Column, SimpleExpr)>,
        what: &'static str,
    ) -> Result<bool, AuthServiceError> {
        let txn = self.begin(scope).await?;
        let mut update = users::Entity::update_many()
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .filter(users::Column::DeletedAt.is_null())
            .filter(tenant_condition(scope));
        for (column, value) in values {
            update = update.col_expr(column, value);
        }
        let result = update.exec(&txn).await.context(what)?;
        txn.commit().await.context("commit")?;
        Ok(result.rows_affected > 0)
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(
        &self,
        scope: &TenantScope,
        email: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        let condition = Condition::all().add(users::Column::Email.eq(email));
        self.find_one(scope, condition, "find user by email").await
    }

    async fn find_by_id(
        &self,
        scope: &TenantScope,
        id: UserId,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        let condition = Condition::all().add(users::Column::Id.eq(id.0));
        self.find_one(scope, condition, "find user by id").await
    }

    async fn create(&self, user: &NewUser) -> Result<AuthUser, AuthServiceError> {
        let scope = TenantScope::Tenant(user.tenant_id);
        let txn = self.begin(&scope).await?;
        let now = Utc::now();

        let inserted = users::ActiveModel {
            id: Set(user.id.0),
            tenant_id: Set(Some(user.tenant_id.0)),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            status: Set("active".to_owned()),
            email_verified: Set(false),
            email_verified_at: Set(None),
            mfa_enabled: Set(false),
            mfa_method: Set(None),
            mfa_secret: Set(None),
            failed_login_attempts: Set(0),
            locked_until: Set(None),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await;

        let model = match inserted {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(AuthServiceError::EmailTaken);
            }
            Err(e) => return Err(anyhow::Error::new(e).context("insert user").into()),
        };

        for role in &user.roles {
            insert_role(&txn, user.id, user.tenant_id, *role, now).await?;
        }

        txn.commit().await.context("commit")?;
        user_from_model(model, user.roles.clone())
    }

    async fn save_lockout(
        &self,
        scope: &TenantScope,
        id: UserId,
        state: &LockoutState,
    ) -> Result<bool, AuthServiceError> {
        let attempts = i32::try_from(state.failed_attempts).unwrap_or(i32::MAX);
        self.update_user(
            scope,
            id,
            vec![
                (users::Column::FailedLoginAttempts, Expr::value(attempts)),
                (users::Column::LockedUntil, Expr::value(state.locked_until)),
            ],
            "save lockout state",
        )
        .await
    }

    async fn record_login(
        &self,
        scope: &TenantScope,
        id: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        self.update_user(
            scope,
            id,
            vec![
                (users::Column::FailedLoginAttempts, Expr::value(0)),
                (
                    users::Column::LockedUntil,
                    Expr::value(Option::<DateTime<Utc>>::None),
                ),
                (users::Column::LastLoginAt, Expr::value(Some(at))),
            ],
            "record login",
        )
        .await?;
        Ok(())
    }

    async fn set_mfa_secret(
        &self,
        scope: &TenantScope,
        id: UserId,
        method: MfaMethod,
        secret: &str,
    ) -> Result<(), AuthServiceError> {
        self.update_user(
            scope,
            id,
            vec![
                (users::Column::MfaMethod, Expr::value(method.as_str())),
                (users::Column::MfaSecret, Expr::value(secret)),
            ],
            "set mfa secret",
        )
        .await?;
        Ok(())
    }

    async fn enable_mfa(&self, scope: &TenantScope, id: UserId) -> Result<(), AuthServiceError> {
        self.update_user(
            scope,
            id,
            vec![(users::Column::MfaEnabled, Expr::value(true))],
            "enable mfa",
        )
        .await?;
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        scope: &TenantScope,
        id: UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        self.update_user(
            scope,
            id,
            vec![
                (users::Column::EmailVerified, Expr::value(true)),
                (users::Column::EmailVerifiedAt, Expr::value(Some(at))),
            ],
            "mark email verified",
        )
        .await
    }
}

async fn insert_role(
    txn: &DatabaseTransaction,
    user_id: UserId,
    tenant_id: TenantId,
    role: Role,
    now: DateTime<Utc>,
) -> Result<(), AuthServiceError> {
    user_roles::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id.0),
        tenant_id: Set(Some(tenant_id.0)),
        role: Set(role.as_str().to_owned()),
        granted_at: Set(now),
        expires_at: Set(None),
    }
    .insert(txn)
    .await
    .context("insert user role")?;
    Ok(())
}

/// Grants with no expiry or an expiry in the future.
async fn live_roles(txn: &DatabaseTransaction, user_id: Uuid) -> Result<Vec<Role>, AuthServiceError> {
    let grants = user_roles::Entity::find()
        .filter(user_roles::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(user_roles::Column::ExpiresAt.is_null())
                .add(user_roles::Column::ExpiresAt.gt(Utc::now())),
        )
        .all(txn)
        .await
        .context("load user roles")?;
    Ok(parse_roles(grants.iter().map(|g| g.role.as_str())))
}

fn user_from_model(model: users::Model, roles: Vec<Role>) -> Result<AuthUser, AuthServiceError> {
    let status: UserStatus = model.status.parse().context("parse user status")?;
    let mfa_method = model
        .mfa_method
        .as_deref()
        .map(str::parse::<MfaMethod>)
        .transpose()
        .context("parse mfa method")?;
    Ok(AuthUser {
        id: UserId(model.id),
        tenant_id: model.tenant_id.map(TenantId),
        email: model.email,
        password_hash: model.password_hash,
        first_name: model.first_name,
        last_name: model.last_name,
        status,
        email_verified: model.email_verified,
        mfa_enabled: model.mfa_enabled,
        mfa_method,
        mfa_secret: model.mfa_secret,
        lockout: LockoutState {
            failed_attempts: u32::try_from(model.failed_login_attempts).unwrap_or(0),
            locked_until: model.locked_until,
        },
        last_login_at: model.last_login_at,
        roles,
        created_at: model.created_at,
    })
}
