use comply_domain::scope::TenantScope;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, Statement,
    TransactionTrait,
};

/// Session settings read by the row-level-security policies.
pub const CURRENT_TENANT_SETTING: &str = "app.current_tenant_id";
pub const GLOBAL_ADMIN_SETTING: &str = "app.is_global_admin";

/// Values for (`app.current_tenant_id`, `app.is_global_admin`) under `scope`.
pub fn scope_settings(scope: &TenantScope) -> (String, String) {
    match scope {
        TenantScope::Tenant(id) => (id.to_string(), "false".to_owned()),
        TenantScope::Global => (String::new(), "true".to_owned()),
    }
}

/// Open a transaction whose RLS settings are bound to `scope`.
///
/// `set_config(.., true)` is transaction-local, so the settings vanish on
/// commit or rollback and never leak onto a pooled connection.
pub async fn begin_scoped(
    db: &DatabaseConnection,
    scope: &TenantScope,
) -> Result<DatabaseTransaction, DbErr> {
    let (tenant, global) = scope_settings(scope);
    let txn = db.begin().await?;
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        format!(
            "SELECT set_config('{CURRENT_TENANT_SETTING}', $1, true), \
             set_config('{GLOBAL_ADMIN_SETTING}', $2, true)"
        ),
        [tenant.into(), global.into()],
    ))
    .await?;
    Ok(txn)
}
