use std::sync::Arc;

use coffeehouse_api::{
    config::AppConfig,
    dto::auth::{ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest},
    dto::users::{UpdatePasswordRequest, UpdateProfileRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::{auth_service, user_service},
    state::AppState,
    store::MemoryStore,
};

fn memory_state() -> AppState {
    let config = AppConfig {
        database_url: None,
        use_memory_db: true,
        jwt_secret: "test-secret".into(),
        jwt_expiry_hours: 24,
        cors_origin: None,
        host: "127.0.0.1".into(),
        port: 0,
    };
    AppState::new(Arc::new(MemoryStore::new()), config)
}

fn signup_request(email: &str, password: &str) -> SignupRequest {
    SignupRequest {
        name: "Casey Customer".into(),
        email: email.into(),
        password: password.into(),
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn signup_then_login_issues_bearer_token() -> anyhow::Result<()> {
    let state = memory_state();

    let user = auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2"))
        .await?
        .data
        .expect("user");
    assert_eq!(user.role, "user");
    assert!(user.active);

    let login = auth_service::login(&state, login_request("casey@example.com", "hunter2hunter2"))
        .await?
        .data
        .expect("login");
    assert!(login.token.starts_with("Bearer "));

    let auth = AuthUser {
        user_id: user.id,
        role: user.role.clone(),
    };
    let me = user_service::me(&state, &auth).await?.data.expect("me");
    assert_eq!(me.email, "casey@example.com");

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> anyhow::Result<()> {
    let state = memory_state();
    auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2")).await?;

    let err = auth_service::login(&state, login_request("casey@example.com", "wrong-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    // unknown accounts look the same as wrong passwords
    let err = auth_service::login(&state, login_request("nobody@example.com", "hunter2hunter2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    Ok(())
}

#[tokio::test]
async fn password_hash_never_appears_in_responses() -> anyhow::Result<()> {
    let state = memory_state();
    let resp =
        auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2")).await?;

    let body = serde_json::to_value(&resp)?;
    let user = &body["data"];
    assert!(user.get("password_hash").is_none());
    assert!(user.get("reset_token").is_none());
    assert!(user.get("email").is_some());

    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> anyhow::Result<()> {
    let state = memory_state();
    auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2")).await?;

    let err = auth_service::signup(&state, signup_request("casey@example.com", "other-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn short_passwords_are_rejected() {
    let state = memory_state();
    let err = auth_service::signup(&state, signup_request("casey@example.com", "short"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn deactivated_accounts_cannot_login() -> anyhow::Result<()> {
    let state = memory_state();
    let user = auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2"))
        .await?
        .data
        .expect("user");

    let auth = AuthUser {
        user_id: user.id,
        role: user.role.clone(),
    };
    user_service::deactivate(&state, &auth).await?;

    let err = auth_service::login(&state, login_request("casey@example.com", "hunter2hunter2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    Ok(())
}

#[tokio::test]
async fn reset_token_flow_replaces_the_password_once() -> anyhow::Result<()> {
    let state = memory_state();
    auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2")).await?;

    let issued = auth_service::forgot_password(
        &state,
        ForgotPasswordRequest {
            email: "casey@example.com".into(),
        },
    )
    .await?
    .data
    .expect("token");

    auth_service::reset_password(
        &state,
        &issued.reset_token,
        ResetPasswordRequest {
            password: "brand-new-password".into(),
        },
    )
    .await?;

    let err = auth_service::login(&state, login_request("casey@example.com", "hunter2hunter2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));
    auth_service::login(&state, login_request("casey@example.com", "brand-new-password")).await?;

    // the token is single-use
    let err = auth_service::reset_password(
        &state,
        &issued.reset_token,
        ResetPasswordRequest {
            password: "another-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn password_change_requires_the_current_password() -> anyhow::Result<()> {
    let state = memory_state();
    let user = auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2"))
        .await?
        .data
        .expect("user");
    let auth = AuthUser {
        user_id: user.id,
        role: user.role.clone(),
    };

    let err = user_service::update_password(
        &state,
        &auth,
        UpdatePasswordRequest {
            current_password: "wrong-password".into(),
            new_password: "brand-new-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    user_service::update_password(
        &state,
        &auth,
        UpdatePasswordRequest {
            current_password: "hunter2hunter2".into(),
            new_password: "brand-new-password".into(),
        },
    )
    .await?;
    auth_service::login(&state, login_request("casey@example.com", "brand-new-password")).await?;

    Ok(())
}

#[tokio::test]
async fn profile_updates_only_touch_profile_fields() -> anyhow::Result<()> {
    let state = memory_state();
    let user = auth_service::signup(&state, signup_request("casey@example.com", "hunter2hunter2"))
        .await?
        .data
        .expect("user");
    let auth = AuthUser {
        user_id: user.id,
        role: user.role.clone(),
    };

    let updated = user_service::update_profile(
        &state,
        &auth,
        UpdateProfileRequest {
            name: Some("Casey C.".into()),
            phone: Some("555-0100".into()),
            address: None,
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(updated.name, "Casey C.");
    assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    assert!(updated.address.is_none());

    // login still works with the original password
    auth_service::login(&state, login_request("casey@example.com", "hunter2hunter2")).await?;

    Ok(())
}
