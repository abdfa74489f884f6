use comply_auth::error::AuthServiceError;
use comply_auth::usecase::token::{
    LoginInput, LoginOutcome, LoginUseCase, LogoutUseCase, RefreshTokenUseCase,
    issue_access_token, issue_mfa_token, issue_refresh_token,
};
use comply_auth_types::token::{
    ACCESS_TOKEN_TTL_SECS, AuthError, TokenKind, validate_access_token, validate_token,
};
use comply_domain::id::UserId;
use comply_domain::role::Role;
use uuid::Uuid;

use crate::helpers::{
    MockTokenStore, MockUserRepo, TEST_JWT_SECRET, TEST_PASSWORD, policy, system_admin,
    test_tenant, test_user,
};

fn login_usecase(users: MockUserRepo, tokens: MockTokenStore) -> LoginUseCase<MockUserRepo, MockTokenStore> {
    LoginUseCase {
        users,
        tokens,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
        policy: policy(),
    }
}

fn refresh_usecase(
    users: MockUserRepo,
    tokens: MockTokenStore,
) -> RefreshTokenUseCase<MockUserRepo, MockTokenStore> {
    RefreshTokenUseCase {
        users,
        tokens,
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    }
}

// ── Token minting ────────────────────────────────────────────────────────────

#[test]
fn should_round_trip_identity_through_access_token() {
    let tenant = test_tenant();
    let user = test_user(tenant, vec![Role::TenantManager, Role::Client]);
    let token = issue_access_token(&user, TEST_JWT_SECRET).unwrap();

    let info = validate_access_token(&token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.tenant_id, Some(tenant));
    assert_eq!(info.email.as_deref(), Some("agent@acme.test"));
    assert_eq!(info.roles, vec![Role::TenantManager, Role::Client]);
}

#[test]
fn should_reject_access_token_signed_with_other_secret() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let token = issue_access_token(&user, TEST_JWT_SECRET).unwrap();
    assert_eq!(
        validate_access_token(&token, "another-secret").unwrap_err(),
        AuthError::InvalidSignature
    );
}

#[test]
fn should_not_accept_typed_tokens_as_access_tokens() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let refresh = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let mfa = issue_mfa_token(&user, TEST_JWT_SECRET).unwrap();

    assert_eq!(
        validate_access_token(&refresh, TEST_JWT_SECRET).unwrap_err(),
        AuthError::WrongType
    );
    assert_eq!(
        validate_access_token(&mfa, TEST_JWT_SECRET).unwrap_err(),
        AuthError::WrongType
    );
    let claims = validate_token(&mfa, TEST_JWT_SECRET, TokenKind::Mfa).unwrap();
    assert_eq!(claims.sub, user.id.to_string());
}

#[test]
fn should_issue_distinct_refresh_tokens_for_same_user() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let first = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let second = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    assert_ne!(first, second);

    let first = validate_token(&first, TEST_JWT_SECRET, TokenKind::Refresh).unwrap();
    let second = validate_token(&second, TEST_JWT_SECRET, TokenKind::Refresh).unwrap();
    assert!(first.jti.is_some());
    assert_ne!(first.jti, second.jti);
}

// ── Login ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_and_persist_token_pair_on_login() {
    let tenant = test_tenant();
    let user = test_user(tenant, vec![Role::Agent]);
    let tokens = MockTokenStore::new();
    let stored = tokens.refresh_handle();
    let usecase = login_usecase(MockUserRepo::new(vec![user.clone()]), tokens);

    let outcome = usecase
        .execute(LoginInput {
            tenant_id: tenant,
            email: "  Agent@Acme.TEST ".to_owned(),
            password: TEST_PASSWORD.to_owned(),
        })
        .await
        .unwrap();

    let LoginOutcome::Authenticated(out) = outcome else {
        panic!("expected tokens, got {outcome:?}");
    };
    assert_eq!(out.expires_in, ACCESS_TOKEN_TTL_SECS);
    assert_eq!(out.user.id, user.id);
    let refresh = out.refresh_token.expect("refresh token issued at login");
    assert_eq!(stored.lock().unwrap().get(&refresh), Some(&user.id));
}

#[tokio::test]
async fn should_reject_unknown_email_as_invalid_credentials() {
    let tenant = test_tenant();
    let usecase = login_usecase(
        MockUserRepo::new(vec![test_user(tenant, vec![Role::Agent])]),
        MockTokenStore::new(),
    );

    let result = usecase
        .execute(LoginInput {
            tenant_id: tenant,
            email: "nobody@acme.test".to_owned(),
            password: TEST_PASSWORD.to_owned(),
        })
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidCredentials)),
        "expected InvalidCredentials, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_find_user_from_another_tenant() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let usecase = login_usecase(MockUserRepo::new(vec![user.clone()]), MockTokenStore::new());

    let result = usecase
        .execute(LoginInput {
            tenant_id: test_tenant(),
            email: user.email,
            password: TEST_PASSWORD.to_owned(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_still_return_tokens_when_token_store_is_down() {
    let tenant = test_tenant();
    let user = test_user(tenant, vec![Role::Agent]);
    let usecase = login_usecase(
        MockUserRepo::new(vec![user.clone()]),
        MockTokenStore::unavailable(),
    );

    let outcome = usecase
        .execute(LoginInput {
            tenant_id: tenant,
            email: user.email.clone(),
            password: TEST_PASSWORD.to_owned(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, LoginOutcome::Authenticated(ref out) if out.refresh_token.is_some()));
}

#[tokio::test]
async fn should_reject_empty_credentials() {
    let usecase = login_usecase(MockUserRepo::empty(), MockTokenStore::new());
    let result = usecase
        .execute(LoginInput {
            tenant_id: test_tenant(),
            email: " ".to_owned(),
            password: String::new(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidInput(_))));
}

// ── Refresh ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_mint_access_token_from_stored_refresh_token() {
    let tenant = test_tenant();
    let user = test_user(tenant, vec![Role::TenantAdmin]);
    let refresh = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let tokens = MockTokenStore::new();
    tokens.refresh_handle().lock().unwrap().insert(refresh.clone(), user.id);

    let out = refresh_usecase(MockUserRepo::new(vec![user.clone()]), tokens)
        .execute(&refresh)
        .await
        .unwrap();

    assert!(out.refresh_token.is_none());
    let info = validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.user_id, user.id);
    assert_eq!(info.tenant_id, Some(tenant));
    assert_eq!(info.roles, vec![Role::TenantAdmin]);
}

#[tokio::test]
async fn should_reject_revoked_refresh_token_with_valid_signature() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let refresh = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let tokens = MockTokenStore::new();
    tokens.refresh_handle().lock().unwrap().insert(refresh.clone(), user.id);

    LogoutUseCase {
        tokens: tokens.clone(),
    }
    .execute(&refresh)
    .await
    .unwrap();

    assert!(validate_token(&refresh, TEST_JWT_SECRET, TokenKind::Refresh).is_ok());
    let result = refresh_usecase(MockUserRepo::new(vec![user]), tokens)
        .execute(&refresh)
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidToken)),
        "expected InvalidToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_access_token_presented_as_refresh_token() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let access = issue_access_token(&user, TEST_JWT_SECRET).unwrap();
    let tokens = MockTokenStore::new();
    tokens.refresh_handle().lock().unwrap().insert(access.clone(), user.id);

    let result = refresh_usecase(MockUserRepo::new(vec![user]), tokens)
        .execute(&access)
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
}

#[tokio::test]
async fn should_reject_refresh_token_stored_for_another_user() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let refresh = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let tokens = MockTokenStore::new();
    tokens
        .refresh_handle()
        .lock()
        .unwrap()
        .insert(refresh.clone(), UserId(Uuid::new_v4()));

    let result = refresh_usecase(MockUserRepo::new(vec![user]), tokens)
        .execute(&refresh)
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
}

#[tokio::test]
async fn should_map_token_store_outage_to_invalid_token_on_refresh() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let refresh = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();

    let result = refresh_usecase(MockUserRepo::new(vec![user]), MockTokenStore::unavailable())
        .execute(&refresh)
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
}

#[tokio::test]
async fn should_refresh_tenantless_system_admin_in_global_scope() {
    let admin = system_admin();
    let refresh = issue_refresh_token(&admin, TEST_JWT_SECRET).unwrap();
    let tokens = MockTokenStore::new();
    tokens.refresh_handle().lock().unwrap().insert(refresh.clone(), admin.id);

    let out = refresh_usecase(MockUserRepo::new(vec![admin.clone()]), tokens)
        .execute(&refresh)
        .await
        .unwrap();
    let info = validate_access_token(&out.access_token, TEST_JWT_SECRET).unwrap();
    assert_eq!(info.tenant_id, None);
    assert_eq!(info.roles, vec![Role::SystemAdmin]);
}

#[tokio::test]
async fn should_reject_tenantless_token_for_regular_user() {
    let mut user = test_user(test_tenant(), vec![Role::Agent]);
    let stored_user = user.clone();
    user.tenant_id = None;
    let refresh = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let tokens = MockTokenStore::new();
    tokens.refresh_handle().lock().unwrap().insert(refresh.clone(), user.id);

    let result = refresh_usecase(MockUserRepo::new(vec![stored_user]), tokens)
        .execute(&refresh)
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidToken)));
}

// ── Logout ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_keep_other_session_alive_after_logout() {
    let user = test_user(test_tenant(), vec![Role::Agent]);
    let laptop = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let phone = issue_refresh_token(&user, TEST_JWT_SECRET).unwrap();
    let tokens = MockTokenStore::new();
    let stored = tokens.refresh_handle();
    stored.lock().unwrap().insert(laptop.clone(), user.id);
    stored.lock().unwrap().insert(phone.clone(), user.id);

    LogoutUseCase {
        tokens: tokens.clone(),
    }
    .execute(&laptop)
    .await
    .unwrap();

    let refresh = refresh_usecase(MockUserRepo::new(vec![user.clone()]), tokens);
    assert!(matches!(
        refresh.execute(&laptop).await,
        Err(AuthServiceError::InvalidToken)
    ));
    assert!(refresh.execute(&phone).await.is_ok());
}

#[tokio::test]
async fn should_treat_logout_of_unknown_token_as_noop() {
    let tokens = MockTokenStore::new();
    let usecase = LogoutUseCase { tokens };
    assert!(usecase.execute("never-issued").await.is_ok());
    assert!(matches!(
        usecase.execute("").await,
        Err(AuthServiceError::InvalidInput(_))
    ));
}
