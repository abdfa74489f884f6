use anyhow::Context as _;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

use comply_core::error::AppError;
use comply_domain::id::TenantId;
use comply_domain::tenant::{Tenant, TenantStatus};
use comply_gateway_schema::tenants;

use crate::domain::repository::TenantLookup;

/// Tenant registry in the shared schema. Not tenant-scoped: resolution happens before
/// any scope exists.
#[derive(Clone)]
pub struct DbTenantLookup {
    pub db: DatabaseConnection,
}

impl DbTenantLookup {
    async fn find_one(
        &self,
        condition: Condition,
        what: &'static str,
    ) -> Result<Option<Tenant>, AppError> {
        let model = tenants::Entity::find()
            .filter(tenants::Column::DeletedAt.is_null())
            .filter(condition)
            .one(&self.db)
            .await
            .context(what)?;
        model.map(tenant_from_model).transpose()
    }
}

impl TenantLookup for DbTenantLookup {
    async fn by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError> {
        let condition = Condition::all().add(tenants::Column::Subdomain.eq(subdomain));
        self.find_one(condition, "find tenant by subdomain").await
    }

    async fn by_id(&self, id: TenantId) -> Result<Option<Tenant>, AppError> {
        let condition = Condition::all().add(tenants::Column::Id.eq(id.0));
        self.find_one(condition, "find tenant by id").await
    }
}

fn tenant_from_model(model: tenants::Model) -> Result<Tenant, AppError> {
    let status: TenantStatus = model.status.parse().context("parse tenant status")?;
    Ok(Tenant {
        id: TenantId(model.id),
        name: model.name,
        subdomain: model.subdomain,
        status,
    })
}
