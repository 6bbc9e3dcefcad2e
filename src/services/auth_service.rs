use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    dto::auth::{
        Claims, ForgotPasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest,
        ResetTokenResponse, SignupRequest,
    },
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

const RESET_TOKEN_TTL_MINUTES: i64 = 10;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<ApiResponse<User>> {
    let SignupRequest {
        name,
        email,
        password,
    } = payload;

    if name.trim().is_empty() || email.trim().is_empty() {
        return Err(AppError::BadRequest("Name and email are required".into()));
    }
    if password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    if state.store.user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already taken".into()));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash: hash_password(&password)?,
        role: "user".into(),
        phone: None,
        address: None,
        reset_token: None,
        reset_token_expires_at: None,
        active: true,
        created_at: now,
        updated_at: now,
    };
    let user = state.store.insert_user(user).await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = state.store.user_by_email(&email).await?;

    // Same rejection for unknown email, wrong password and deactivated
    // accounts.
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized),
    };
    if !user.active || !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(state.config.jwt_expiry_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    tracing::info!(user_id = %user.id, "user logged in");

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<ResetTokenResponse>> {
    let user = state.store.user_by_email(&payload.email).await?;
    let mut user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    user.reset_token = Some(token.clone());
    user.reset_token_expires_at = Some(expires_at);
    state.store.update_user(user).await?;

    let resp = ResetTokenResponse {
        reset_token: token,
        expires_at,
    };
    Ok(ApiResponse::success(
        "Reset token issued",
        resp,
        Some(Meta::empty()),
    ))
}

pub async fn reset_password(
    state: &AppState,
    token: &str,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<User>> {
    if payload.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let user = state.store.user_by_reset_token(token).await?;
    let mut user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::BadRequest(
                "Token is invalid or has expired".into(),
            ));
        }
    };
    let expired = user
        .reset_token_expires_at
        .is_none_or(|at| at < Utc::now());
    if expired {
        return Err(AppError::BadRequest(
            "Token is invalid or has expired".into(),
        ));
    }

    user.password_hash = hash_password(&payload.password)?;
    user.reset_token = None;
    user.reset_token_expires_at = None;
    let user = state.store.update_user(user).await?;

    tracing::info!(user_id = %user.id, "password reset");
    Ok(ApiResponse::success(
        "Password updated",
        user,
        Some(Meta::empty()),
    ))
}
