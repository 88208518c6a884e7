use crate::{
    db::users as db_users,
    error::AppError,
    middleware::auth::{
        create_access_token, create_refresh_token, hash_token, verify_token, AuthUser,
        ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS,
    },
    models::user::*,
    routes::notes::AppState,
    validation,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::SqlitePool;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // Validate input shape before touching the store
    let errors = validation::validate_credentials(req.email.as_deref(), req.password.as_deref());
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    // 검증을 통과했으므로 두 필드 모두 Some입니다.
    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let password = req.password.as_deref().unwrap_or_default();

    // Email addresses are unique account identifiers
    if db_users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::BadRequest("User already registered".to_string()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    // Create user
    let user_id = uuid::Uuid::now_v7().to_string();
    let user = db_users::create_user(&state.pool, &user_id, &email, &password_hash).await?;
    tracing::info!("New user registered: {}", user.id);

    let session = issue_session(&state.pool, &user.id, &state.jwt_secret).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": AuthResponse { user: user.into(), session },
        })),
    ))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<Value>, AppError> {
    let errors = validation::validate_credentials(req.email.as_deref(), req.password.as_deref());
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let password = req.password.as_deref().unwrap_or_default();

    // Unknown email and wrong password produce the same response,
    // so callers cannot probe which addresses have accounts.
    let user = db_users::find_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::Unauthorized("Invalid login credentials".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password hash parse error: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid login credentials".to_string()))?;

    let session = issue_session(&state.pool, &user.id, &state.jwt_secret).await?;

    Ok(Json(json!({
        "success": true,
        "data": AuthResponse { user: user.into(), session },
    })))
}

pub async fn signout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    // Revoke every refresh token for this user
    db_users::delete_user_refresh_tokens(&state.pool, &auth_user.user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Signed out successfully",
    })))
}

pub async fn current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    // 토큰은 유효한데 사용자 행이 사라진 경우(탈퇴 등)도 401 하나로 수렴합니다.
    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::Unauthorized("Invalid or expired token".to_string()))?;

    let user: UserResponse = user.into();
    Ok(Json(json!({ "success": true, "data": { "user": user } })))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<Value>, AppError> {
    // Verify the refresh token JWT
    verify_token(&req.refresh_token, &state.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    // Check if refresh token hash exists in DB
    let token_hash = hash_token(&req.refresh_token);
    let (_token_id, user_id, expires_at) = db_users::find_refresh_token(&state.pool, &token_hash)
        .await?
        .ok_or(AppError::Unauthorized("Refresh token not found or revoked".to_string()))?;

    // Check expiration
    let expires = chrono::NaiveDateTime::parse_from_str(&expires_at, "%Y-%m-%dT%H:%M:%S%.3fZ")
        .map_err(|e| AppError::Internal(format!("Date parse error: {}", e)))?;
    if expires.and_utc() < Utc::now() {
        db_users::delete_refresh_token(&state.pool, &token_hash).await?;
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    // Verify user still exists
    let user = db_users::find_by_id(&state.pool, &user_id)
        .await?
        .ok_or(AppError::Unauthorized("User not found".to_string()))?;

    // Rotate: the old token is single-use
    db_users::delete_refresh_token(&state.pool, &token_hash).await?;
    let session = issue_session(&state.pool, &user.id, &state.jwt_secret).await?;

    Ok(Json(json!({
        "success": true,
        "data": AuthResponse { user: user.into(), session },
    })))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let errors = validation::validate_password_change(
        req.current_password.as_deref(),
        req.new_password.as_deref(),
    );
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let current_password = req.current_password.as_deref().unwrap_or_default();
    let new_password = req.new_password.as_deref().unwrap_or_default();

    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::Unauthorized("Invalid or expired token".to_string()))?;

    // Fresh credential check: a stolen access token alone must not
    // be enough to take over the account.
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password hash parse error: {}", e)))?;

    Argon2::default()
        .verify_password(current_password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Current password is incorrect".to_string()))?;

    // Hash the new password with a fresh salt
    let salt = SaltString::generate(&mut OsRng);
    let new_hash = Argon2::default()
        .hash_password(new_password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    db_users::update_password(&state.pool, &user.id, &new_hash).await?;

    // 비밀번호가 바뀌면 떠돌던 리프레시 토큰도 전부 무효화합니다.
    db_users::delete_user_refresh_tokens(&state.pool, &user.id).await?;
    tracing::info!("Password changed for user {}", user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully",
    })))
}

pub async fn change_email(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<ChangeEmailRequest>,
) -> Result<Json<Value>, AppError> {
    // Normalize before validating, same as the address will be stored
    let normalized = req.new_email.as_deref().map(normalize_email);
    let errors = validation::validate_email_change(normalized.as_deref());
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let new_email = normalized.unwrap_or_default();

    let user = db_users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::Unauthorized("Invalid or expired token".to_string()))?;

    if let Some(existing) = db_users::find_by_email(&state.pool, &new_email).await? {
        if existing.id != user.id {
            return Err(AppError::BadRequest("Email already in use".to_string()));
        }
    }

    // The visible address only changes once the new one is confirmed.
    // Until then it is staged in pending_email.
    let user = db_users::set_pending_email(&state.pool, &user.id, &new_email).await?;
    tracing::info!("Verification email queued for user {}", user.id);

    let user: UserResponse = user.into();
    Ok(Json(json!({
        "success": true,
        "data": { "user": user },
        "message": "Verification email sent to the new address",
    })))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Issue a fresh access/refresh token pair and persist the refresh
// token's hash so it can be revoked or rotated later.
async fn issue_session(
    pool: &SqlitePool,
    user_id: &str,
    jwt_secret: &str,
) -> Result<Session, AppError> {
    let access_token = create_access_token(user_id, jwt_secret)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;
    let refresh_token = create_refresh_token(user_id, jwt_secret)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    let token_id = uuid::Uuid::now_v7().to_string();
    let token_hash = hash_token(&refresh_token);
    let expires_at = (Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    db_users::store_refresh_token(pool, &token_id, user_id, &token_hash, &expires_at).await?;

    Ok(Session {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: ACCESS_TOKEN_TTL_MINUTES * 60,
    })
}
