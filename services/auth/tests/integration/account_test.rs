use chrono::{Duration, Utc};
use uuid::Uuid;

use comply_auth::domain::lockout::LockoutState;
use comply_auth::error::AuthServiceError;
use comply_auth::infra::password::verify_password;
use comply_auth::usecase::account::{
    GetProfileUseCase, RegisterInput, RegisterUseCase, UnlockUserUseCase, VerifyEmailUseCase,
};
use comply_auth_types::identity::IdentityHeaders;
use comply_domain::id::{TenantId, UserId};
use comply_domain::role::Role;

use crate::helpers::{MockTokenStore, MockUserRepo, policy, test_tenant, test_user};

fn register_input(tenant_id: TenantId, email: &str, password: &str) -> RegisterInput {
    RegisterInput {
        tenant_id,
        email: email.to_owned(),
        password: password.to_owned(),
        first_name: "Grace".to_owned(),
        last_name: "Hopper".to_owned(),
    }
}

fn caller(tenant_id: Option<TenantId>, roles: Vec<Role>) -> IdentityHeaders {
    IdentityHeaders {
        user_id: UserId(Uuid::new_v4()),
        tenant_id,
        roles,
    }
}

fn locked(mut user: comply_auth::domain::types::AuthUser) -> comply_auth::domain::types::AuthUser {
    user.lockout = LockoutState {
        failed_attempts: 5,
        locked_until: Some(Utc::now() + Duration::minutes(20)),
    };
    user
}

// ── Register ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_client_and_issue_verification_token() {
    let tenant = test_tenant();
    let users = MockUserRepo::empty();
    let tokens = MockTokenStore::new();
    let pending = tokens.verification_handle();

    let user = RegisterUseCase {
        users: users.clone(),
        tokens,
    }
    .execute(register_input(tenant, " Grace@Navy.MIL ", "s3cure-pass"))
    .await
    .unwrap();

    assert_eq!(user.email, "grace@navy.mil");
    assert_eq!(user.roles, vec![Role::Client]);
    assert_eq!(user.tenant_id, Some(tenant));
    assert!(!user.email_verified);
    assert!(verify_password("s3cure-pass", &user.password_hash).unwrap());

    let pending = pending.lock().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending.values().next(), Some(&user.id));
}

#[tokio::test]
async fn should_reject_duplicate_email_in_same_tenant() {
    let tenant = test_tenant();
    let usecase = RegisterUseCase {
        users: MockUserRepo::empty(),
        tokens: MockTokenStore::new(),
    };
    usecase
        .execute(register_input(tenant, "dup@acme.test", "long-enough"))
        .await
        .unwrap();

    let result = usecase
        .execute(register_input(tenant, "DUP@acme.test", "long-enough"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::EmailTaken)));

    // Another tenant may reuse the address.
    assert!(
        usecase
            .execute(register_input(test_tenant(), "dup@acme.test", "long-enough"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn should_validate_registration_input() {
    let usecase = RegisterUseCase {
        users: MockUserRepo::empty(),
        tokens: MockTokenStore::new(),
    };
    let tenant = test_tenant();

    for (email, password) in [("no-at-sign", "long-enough"), ("a@b.test", "short")] {
        let result = usecase.execute(register_input(tenant, email, password)).await;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidInput(_))),
            "{email}/{password}: expected InvalidInput, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_register_even_when_token_store_is_down() {
    let result = RegisterUseCase {
        users: MockUserRepo::empty(),
        tokens: MockTokenStore::unavailable(),
    }
    .execute(register_input(test_tenant(), "ok@acme.test", "long-enough"))
    .await;
    assert!(result.is_ok());
}

// ── Verify e-mail ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_verify_email_once() {
    let tenant = test_tenant();
    let mut user = test_user(tenant, vec![Role::Client]);
    user.email_verified = false;
    let users = MockUserRepo::new(vec![user.clone()]);
    let handle = users.users_handle();
    let tokens = MockTokenStore::new();
    tokens
        .verification_handle()
        .lock()
        .unwrap()
        .insert("verify-me".to_owned(), user.id);

    let usecase = VerifyEmailUseCase { users, tokens };
    usecase.execute(tenant, "verify-me").await.unwrap();
    assert!(handle.lock().unwrap()[0].email_verified);

    let again = usecase.execute(tenant, "verify-me").await;
    match again {
        Err(AuthServiceError::InvalidInput(msg)) => {
            assert_eq!(msg, "invalid or expired verification token")
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

// ── Unlock ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_tenant_manager_unlock_user_before_deadline() {
    let tenant = test_tenant();
    let target = locked(test_user(tenant, vec![Role::Client]));
    let users = MockUserRepo::new(vec![target.clone()]);
    let handle = users.users_handle();

    UnlockUserUseCase {
        users,
        policy: policy(),
    }
    .execute(&caller(Some(tenant), vec![Role::TenantManager]), target.id)
    .await
    .unwrap();

    assert_eq!(handle.lock().unwrap()[0].lockout, LockoutState::default());
}

#[tokio::test]
async fn should_forbid_unlock_below_manager_level() {
    let tenant = test_tenant();
    let target = locked(test_user(tenant, vec![Role::Client]));
    let users = MockUserRepo::new(vec![target.clone()]);
    let handle = users.users_handle();

    let result = UnlockUserUseCase {
        users,
        policy: policy(),
    }
    .execute(&caller(Some(tenant), vec![Role::Agent, Role::Client]), target.id)
    .await;

    match result {
        Err(AuthServiceError::InsufficientPermissions(msg)) => {
            assert_eq!(msg, "requires role level 3 or higher")
        }
        other => panic!("expected InsufficientPermissions, got {other:?}"),
    }
    assert_eq!(handle.lock().unwrap()[0].lockout.failed_attempts, 5);
}

#[tokio::test]
async fn should_not_unlock_user_of_another_tenant() {
    let target = locked(test_user(test_tenant(), vec![Role::Client]));
    let result = UnlockUserUseCase {
        users: MockUserRepo::new(vec![target.clone()]),
        policy: policy(),
    }
    .execute(&caller(Some(test_tenant()), vec![Role::TenantAdmin]), target.id)
    .await;
    assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
}

#[tokio::test]
async fn should_let_tenantless_system_admin_unlock_across_tenants() {
    let target = locked(test_user(test_tenant(), vec![Role::Client]));
    let users = MockUserRepo::new(vec![target.clone()]);
    let handle = users.users_handle();

    UnlockUserUseCase {
        users,
        policy: policy(),
    }
    .execute(&caller(None, vec![Role::SystemAdmin]), target.id)
    .await
    .unwrap();
    assert!(!handle.lock().unwrap()[0].lockout.is_locked(Utc::now()));
}

// ── Profile ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_own_profile() {
    let tenant = test_tenant();
    let user = test_user(tenant, vec![Role::Agent]);
    let profile = GetProfileUseCase {
        users: MockUserRepo::new(vec![user.clone()]),
    }
    .execute(&IdentityHeaders {
        user_id: user.id,
        tenant_id: Some(tenant),
        roles: vec![Role::Agent],
    })
    .await
    .unwrap();
    assert_eq!(profile.id, user.id);
}

#[tokio::test]
async fn should_require_tenant_for_regular_profile_lookup() {
    let result = GetProfileUseCase {
        users: MockUserRepo::empty(),
    }
    .execute(&caller(None, vec![Role::Agent]))
    .await;
    assert!(matches!(result, Err(AuthServiceError::TenantContextMissing)));
}
