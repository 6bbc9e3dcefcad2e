use crate::{
    dto::users::{UpdatePasswordRequest, UpdateProfileRequest, UserList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::{hash_password, verify_password},
    state::AppState,
};

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let profile = state
        .store
        .user_by_id(user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Profile", profile, None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let mut profile = state
        .store
        .user_by_id(user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("Name must not be empty".into()));
        }
        profile.name = name;
    }
    if let Some(phone) = payload.phone {
        profile.phone = Some(phone);
    }
    if let Some(address) = payload.address {
        profile.address = Some(address);
    }

    let profile = state.store.update_user(profile).await?;
    Ok(ApiResponse::success(
        "Profile updated",
        profile,
        Some(Meta::empty()),
    ))
}

pub async fn update_password(
    state: &AppState,
    user: &AuthUser,
    payload: UpdatePasswordRequest,
) -> AppResult<ApiResponse<User>> {
    if payload.new_password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let mut profile = state
        .store
        .user_by_id(user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !verify_password(&payload.current_password, &profile.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    profile.password_hash = hash_password(&payload.new_password)?;
    let profile = state.store.update_user(profile).await?;

    tracing::info!(user_id = %profile.id, "password changed");
    Ok(ApiResponse::success(
        "Password updated",
        profile,
        Some(Meta::empty()),
    ))
}

/// Soft delete; the row stays for order history, logins stop working.
pub async fn deactivate(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut profile = state
        .store
        .user_by_id(user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    profile.active = false;
    state.store.update_user(profile).await?;

    tracing::info!(user_id = %user.user_id, "account deactivated");
    Ok(ApiResponse::success(
        "Account deactivated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let (items, total) = state.store.list_users(limit, offset).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}
