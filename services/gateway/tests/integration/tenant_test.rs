use uuid::Uuid;

use comply_core::error::AppError;
use comply_domain::role::Role;
use comply_domain::scope::TenantScope;
use comply_domain::tenant::TenantStatus;
use comply_gateway::usecase::tenant::{TenantHints, TenantResolver, TenantSource};
use comply_testing::fixture::{active_tenant, tenant};

use crate::helpers::{MockTenantLookup, identity};

fn hints(host: Option<&str>, header: Option<String>) -> TenantHints {
    TenantHints {
        host: host.map(str::to_owned),
        tenant_header: header,
    }
}

#[tokio::test]
async fn should_prefer_subdomain_over_header() {
    let acme = active_tenant("acme");
    let other = active_tenant("other");
    let resolver = TenantResolver {
        lookup: MockTenantLookup::new(vec![acme.clone(), other.clone()]),
    };

    let resolution = resolver
        .resolve(
            &hints(Some("acme.comply360.com"), Some(other.id.to_string())),
            None,
        )
        .await
        .unwrap();
    assert_eq!(resolution.scope, TenantScope::Tenant(acme.id));
    assert_eq!(resolution.source, TenantSource::Subdomain);
    assert_eq!(resolution.tenant, Some(acme));
}

#[tokio::test]
async fn should_not_fall_back_when_subdomain_is_unknown() {
    let other = active_tenant("other");
    let resolver = TenantResolver {
        lookup: MockTenantLookup::new(vec![other.clone()]),
    };

    let err = resolver
        .resolve(
            &hints(Some("ghost.comply360.com"), Some(other.id.to_string())),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TenantNotFound));
}

#[tokio::test]
async fn should_reject_suspended_tenant_whichever_source_resolved_it() {
    let suspended = tenant("dormant", TenantStatus::Suspended);
    let resolver = TenantResolver {
        lookup: MockTenantLookup::new(vec![suspended.clone()]),
    };
    let caller = identity(Some(suspended.id), &[Role::Agent]);

    let by_subdomain = resolver
        .resolve(&hints(Some("dormant.comply360.com"), None), None)
        .await
        .unwrap_err();
    let by_header = resolver
        .resolve(&hints(None, Some(suspended.id.to_string())), None)
        .await
        .unwrap_err();
    let by_claim = resolver
        .resolve(&hints(None, None), Some(&caller))
        .await
        .unwrap_err();

    for err in [by_subdomain, by_header, by_claim] {
        assert!(matches!(err, AppError::TenantSuspended), "got {err:?}");
        assert_eq!(err.code(), "TENANT_SUSPENDED");
    }
}

#[tokio::test]
async fn should_treat_deleted_status_as_inactive() {
    let deleted = tenant("gone", TenantStatus::Deleted);
    let resolver = TenantResolver {
        lookup: MockTenantLookup::new(vec![deleted.clone()]),
    };
    let err = resolver
        .resolve(&hints(None, Some(deleted.id.to_string())), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TenantSuspended));
}

#[tokio::test]
async fn should_reject_malformed_tenant_header() {
    let resolver = TenantResolver {
        lookup: MockTenantLookup::default(),
    };
    let err = resolver
        .resolve(&hints(None, Some("not-a-uuid".to_owned())), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");
}

#[tokio::test]
async fn should_report_unknown_tenant_id_as_not_found() {
    let resolver = TenantResolver {
        lookup: MockTenantLookup::default(),
    };
    let err = resolver
        .resolve(&hints(None, Some(Uuid::new_v4().to_string())), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TenantNotFound));
}

#[tokio::test]
async fn should_ignore_reserved_subdomain_and_use_header() {
    let acme = active_tenant("acme");
    let resolver = TenantResolver {
        lookup: MockTenantLookup::new(vec![acme.clone()]),
    };
    let resolution = resolver
        .resolve(
            &hints(Some("api.comply360.com"), Some(acme.id.to_string())),
            None,
        )
        .await
        .unwrap();
    assert_eq!(resolution.source, TenantSource::Header);
    assert_eq!(resolution.scope, TenantScope::Tenant(acme.id));
}

#[tokio::test]
async fn should_fall_back_to_token_claim() {
    let acme = active_tenant("acme");
    let resolver = TenantResolver {
        lookup: MockTenantLookup::new(vec![acme.clone()]),
    };
    let caller = identity(Some(acme.id), &[Role::Agent]);
    let resolution = resolver
        .resolve(&hints(Some("localhost:8080"), None), Some(&caller))
        .await
        .unwrap();
    assert_eq!(resolution.source, TenantSource::TokenClaim);
    assert_eq!(resolution.scope, TenantScope::Tenant(acme.id));
}

#[tokio::test]
async fn should_require_tenant_context_for_ordinary_callers() {
    let resolver = TenantResolver {
        lookup: MockTenantLookup::default(),
    };
    let anonymous = resolver
        .resolve(&hints(None, None), None)
        .await
        .unwrap_err();
    assert!(matches!(anonymous, AppError::TenantContextMissing));

    let agent = identity(None, &[Role::Agent]);
    let err = resolver
        .resolve(&hints(None, None), Some(&agent))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TenantContextMissing));
}

#[tokio::test]
async fn should_resolve_global_scope_for_tenantless_system_caller() {
    let resolver = TenantResolver {
        lookup: MockTenantLookup::default(),
    };
    for role in [Role::SystemAdmin, Role::GlobalAdmin] {
        let caller = identity(None, &[role]);
        let resolution = resolver
            .resolve(&hints(None, None), Some(&caller))
            .await
            .unwrap();
        assert_eq!(resolution.scope, TenantScope::Global);
        assert_eq!(resolution.tenant, None);
        assert_eq!(resolution.source, TenantSource::Global);
    }
}

#[tokio::test]
async fn should_honour_explicit_tenant_for_system_caller() {
    let acme = active_tenant("acme");
    let resolver = TenantResolver {
        lookup: MockTenantLookup::new(vec![acme.clone()]),
    };
    let caller = identity(None, &[Role::SystemAdmin]);
    let resolution = resolver
        .resolve(&hints(None, Some(acme.id.to_string())), Some(&caller))
        .await
        .unwrap();
    assert_eq!(resolution.scope, TenantScope::Tenant(acme.id));
    assert_eq!(resolution.source, TenantSource::Header);
}
