//! Platform admin, user registration, login and scope resolution.

mod common;

use tillpoint_backend::services::RegisterUserInput;
use tillpoint_backend::ErrorCode;
use tillpoint_core::{TenantPatch, UserRole};

#[tokio::test]
async fn test_admin_credentials_gate_tenant_management() {
    let app = common::app().await;

    let err = app.auth().authorize_admin("root", "guess").unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    let admin = common::admin(&app);
    let (_, token) = common::tenant(&app, "Warung Bu Sri").await;

    let updated = app
        .tenants()
        .update(
            &admin,
            &token,
            TenantPatch {
                phone: Some("0812-555".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Warung Bu Sri");
    assert_eq!(updated.phone.as_deref(), Some("0812-555"));

    assert_eq!(app.tenants().get(&admin, &token).await.unwrap().id, token);
    assert_eq!(app.tenants().list(&admin, 1, 10).await.unwrap().total, 1);

    let err = app
        .tenants()
        .get(&admin, &app.codec.encode_row_id(999))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_login_resolves_tenant_scope() {
    let app = common::app().await;
    let admin = common::admin(&app);
    let (scope, tenant_token) = common::tenant(&app, "Warung A").await;

    let user = app
        .auth()
        .register_user(
            &admin,
            RegisterUserInput {
                username: "kasir01".to_string(),
                password: "rahasia123".to_string(),
                role: UserRole::User,
                tenant_id: Some(tenant_token.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(user.tenant_id.as_deref(), Some(tenant_token.as_str()));

    let login = app.auth().login("kasir01", "rahasia123").await.unwrap();
    assert_eq!(login.token_type, "Bearer");
    assert_eq!(login.user.id, user.id);

    let resolved = app
        .auth()
        .resolve_scope(&format!("Bearer {}", login.access_token))
        .unwrap();
    assert_eq!(resolved, scope);

    let err = app.auth().login("kasir01", "wrong-pass").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    let err = app.auth().login("nobody", "rahasia123").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn test_scope_resolution_failures() {
    let app = common::app().await;
    let admin = common::admin(&app);

    app.auth()
        .register_user(
            &admin,
            RegisterUserInput {
                username: "owner".to_string(),
                password: "rahasia123".to_string(),
                role: UserRole::Admin,
                tenant_id: None,
            },
        )
        .await
        .unwrap();
    let login = app.auth().login("owner", "rahasia123").await.unwrap();

    let err = app
        .auth()
        .resolve_scope(&format!("Bearer {}", login.access_token))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MissingTenantScope);

    let err = app.auth().resolve_scope("Bearer not.a.jwt").unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    let err = app.auth().resolve_scope(&login.access_token).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    // Well-signed token whose tenant claim is garbage.
    let forged = app
        .jwt
        .issue("USR", "owner", UserRole::User, Some("!!bad!!"))
        .unwrap();
    let err = app
        .auth()
        .resolve_scope(&format!("Bearer {forged}"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidTokenFormat);
}

#[tokio::test]
async fn test_register_user_rules() {
    let app = common::app().await;
    let admin = common::admin(&app);

    let input = RegisterUserInput {
        username: "kasir01".to_string(),
        password: "rahasia123".to_string(),
        role: UserRole::User,
        tenant_id: Some(app.codec.encode_row_id(42)),
    };
    let err = app.auth().register_user(&admin, input.clone()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let (_, token) = common::tenant(&app, "Warung A").await;
    let input = RegisterUserInput {
        tenant_id: Some(token),
        ..input
    };
    app.auth().register_user(&admin, input.clone()).await.unwrap();

    let err = app.auth().register_user(&admin, input.clone()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    let err = app
        .auth()
        .register_user(
            &admin,
            RegisterUserInput {
                password: "123".to_string(),
                username: "kasir02".to_string(),
                ..input
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}
