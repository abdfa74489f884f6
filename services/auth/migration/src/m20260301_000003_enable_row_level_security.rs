use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const TABLES: [&str; 2] = ["users", "user_roles"];

/// Rows are visible when they belong to `app.current_tenant_id` or when
/// `app.is_global_admin` is set. Both settings are transaction-local.
fn enable_sql(table: &str) -> String {
    format!(
        "ALTER TABLE {table} ENABLE ROW LEVEL SECURITY;
         ALTER TABLE {table} FORCE ROW LEVEL SECURITY;
         CREATE POLICY {table}_tenant_isolation ON {table}
           USING (
             current_setting('app.is_global_admin', true) = 'true'
             OR tenant_id::text = current_setting('app.current_tenant_id', true)
           );"
    )
}

fn disable_sql(table: &str) -> String {
    format!(
        "DROP POLICY IF EXISTS {table}_tenant_isolation ON {table};
         ALTER TABLE {table} NO FORCE ROW LEVEL SECURITY;
         ALTER TABLE {table} DISABLE ROW LEVEL SECURITY;"
    )
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for table in TABLES {
            db.execute_unprepared(&enable_sql(table)).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for table in TABLES {
            db.execute_unprepared(&disable_sql(table)).await?;
        }
        Ok(())
    }
}
